//! Thin re-export of the linear algebra types used throughout the core.
//!
//! Kept as its own module (mirroring the teacher's `crate::linalg` seam) so
//! the rest of the crate depends on `crate::linalg::*` rather than on
//! `nalgebra` directly, which is the only place a future change of linear
//! algebra backend would have to touch.

pub use nalgebra::{Matrix3, Matrix6, Vector3, Vector6};
