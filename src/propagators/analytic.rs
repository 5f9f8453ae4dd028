//! Analytic element-set propagator (`spec.md` §4.3), wrapping the `sgp4`
//! crate the way the teacher's own propagator tests delegate numerical
//! propagation to a dedicated crate rather than re-deriving SGP4
//! (`tests/stat_od/multi_body.rs`'s `nyx::propagators::{PropOpts,
//! Propagator, RK4Fixed}`).

use hifitime::Epoch;

use crate::element_set::ElementSet;
use crate::errors::{PropagationErrorCode, PropagatorError};
use crate::linalg::Vector3;
use crate::state::State;

/// Wraps one validated [`ElementSet`] and its precomputed SGP4 constants.
pub struct AnalyticPropagator {
    element_set: ElementSet,
    constants: sgp4::Constants,
}

impl AnalyticPropagator {
    /// Builds the propagator from an already-validated element set.
    /// `spec.md` §4.3: malformed/out-of-range elements are rejected at
    /// [`ElementSet::parse`] time, not here.
    pub fn new(element_set: ElementSet) -> Result<Self, PropagatorError> {
        let elements = sgp4::Elements::from_tle(
            Some(element_set.name.clone()),
            element_set.line1.as_bytes(),
            element_set.line2.as_bytes(),
        )
        .map_err(|e| PropagatorError::Propagation {
            code: PropagationErrorCode::NearSingular,
            reason: e.to_string(),
        })?;

        let constants = sgp4::Constants::from_elements(&elements).map_err(|e| PropagatorError::Propagation {
            code: PropagationErrorCode::NearSingular,
            reason: e.to_string(),
        })?;

        Ok(Self { element_set, constants })
    }

    pub fn element_set(&self) -> &ElementSet {
        &self.element_set
    }

    /// Position + velocity at `epoch`, per `spec.md` §4.3. Any SGP4 failure
    /// (decay, near-singular geometry, out-of-range time) is reported as
    /// [`PropagatorError::Propagation`]; callers must treat this as a
    /// per-object skip, never a fatal error (`spec.md` §7).
    pub fn propagate(&self, epoch: Epoch) -> Result<State, PropagatorError> {
        let minutes_since_epoch = (epoch - self.element_set.epoch).to_seconds() / 60.0;

        let prediction = self
            .constants
            .propagate(minutes_since_epoch)
            .map_err(|e| PropagatorError::Propagation {
                code: classify_sgp4_error(&e),
                reason: e.to_string(),
            })?;

        let position_m = Vector3::new(prediction.position[0], prediction.position[1], prediction.position[2]) * 1000.0;
        let velocity_m_s =
            Vector3::new(prediction.velocity[0], prediction.velocity[1], prediction.velocity[2]) * 1000.0;

        let state = State::new(position_m, velocity_m_s, epoch);
        if !state.is_physical() {
            return Err(PropagatorError::Propagation {
                code: PropagationErrorCode::NonFinite,
                reason: "SGP4 produced a non-finite or sub-surface state".to_string(),
            });
        }

        Ok(state)
    }
}

fn classify_sgp4_error(error: &sgp4::Error) -> PropagationErrorCode {
    match error {
        sgp4::Error::OutOfRangeEccentricity { .. } | sgp4::Error::OutOfRangePerturbedEccentricity { .. } => {
            PropagationErrorCode::NearSingular
        }
        sgp4::Error::NegativeSemiLatusRectum { .. } => PropagationErrorCode::Decay,
    }
}
