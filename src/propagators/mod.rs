//! Propagators (`spec.md` §4.3, §4.4): an analytic SGP4 propagator and a
//! numerical adaptive integrator, sharing the [`crate::state::State`]
//! output type and [`crate::errors::PropagatorError`] failure type.

pub mod analytic;
pub mod numerical;

pub use analytic::AnalyticPropagator;
pub use numerical::{DormandPrince54, Fehlberg78, NumericalPropagator, Tableau};
