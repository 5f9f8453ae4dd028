//! The [`State`] value type (`spec.md` §3): output of any propagator.

use hifitime::Epoch;

use crate::force_model::R_EARTH;
use crate::linalg::Vector3;

/// Position (m) + velocity (m/s) at an epoch, in the core's single inertial
/// frame. Produced by a propagator; a plain value with no shared ownership.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub position_m: Vector3<f64>,
    pub velocity_m_s: Vector3<f64>,
    pub epoch: Epoch,
}

impl State {
    pub fn new(position_m: Vector3<f64>, velocity_m_s: Vector3<f64>, epoch: Epoch) -> Self {
        Self {
            position_m,
            velocity_m_s,
            epoch,
        }
    }

    /// `spec.md` §3: position magnitude must exceed the planet radius and
    /// every component must be finite.
    pub fn is_physical(&self) -> bool {
        self.position_m.norm() > R_EARTH
            && self.position_m.iter().all(|v| v.is_finite())
            && self.velocity_m_s.iter().all(|v| v.is_finite())
    }

    /// Position in km, for CDM serialization and human-facing output.
    pub fn position_km(&self) -> Vector3<f64> {
        self.position_m / 1000.0
    }

    /// Velocity in km/s, for CDM serialization and human-facing output.
    pub fn velocity_km_s(&self) -> Vector3<f64> {
        self.velocity_m_s / 1000.0
    }
}
