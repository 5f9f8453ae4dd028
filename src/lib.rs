//! A space situational awareness core: analytic and numerical orbit
//! propagation, conjunction screening, covariance propagation, collision
//! probability estimation, and CDM serialization.

pub mod catalog;
pub mod cdm;
pub mod config;
pub mod covariance;
pub mod element_set;
pub mod errors;
pub mod event;
pub mod force_model;
pub mod interfaces;
pub mod linalg;
pub mod orchestrator;
pub mod pc;
pub mod propagators;
pub mod screener;
pub mod state;
pub mod time;

/// Convenience re-exports for the common top-level types, the way the
/// teacher's crate root groups its most-used items for downstream crates.
pub mod prelude {
    pub use crate::catalog::{Catalog, CatalogEntry, Tags};
    pub use crate::config::{CoreConfig, ForceModelConfig, PcConfig, ScreeningConfig};
    pub use crate::element_set::ElementSet;
    pub use crate::errors::CoreError;
    pub use crate::event::{Event, EventId};
    pub use crate::orchestrator::{AssessSigmas, Core};
    pub use crate::pc::RiskBand;
    pub use crate::screener::CloseApproach;
    pub use crate::state::State;
}
