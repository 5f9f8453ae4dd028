//! Error types for the core, composed the way the teacher composes
//! `DynamicsError`/`ODError`/`NyxError`: one `snafu`-derived enum per
//! subsystem, wired together with `#[snafu(context(false))]`/explicit
//! `ResultExt::context` conversions into the top-level [`CoreError`] the
//! orchestrator returns to callers.

use snafu::Snafu;

use crate::event::EventId;

/// `spec.md` §3's element-set constraints failed to hold.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(visibility(pub))]
pub enum ElementSetError {
    #[snafu(display("TLE line {line} has length {len}, expected 69"))]
    BadLineLength { line: u8, len: usize },

    #[snafu(display("eccentricity {eccentricity} is not in [0, 1)"))]
    EccentricityOutOfRange { eccentricity: f64 },

    #[snafu(display("inclination {inclination_deg} deg is not in [0, 180]"))]
    InclinationOutOfRange { inclination_deg: f64 },

    #[snafu(display("mean motion {mean_motion_rev_per_day} rev/day is not positive"))]
    NonPositiveMeanMotion { mean_motion_rev_per_day: f64 },

    #[snafu(display("could not parse TLE: {reason}"))]
    Unparseable { reason: String },
}

/// Distinguishes the three failure families `spec.md` §4.3/§4.4 call out
/// for the underlying SGP4/numerical routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationErrorCode {
    /// SGP4 signalled orbital decay (perigee below the atmosphere).
    Decay,
    /// Near-singular geometry (e.g. near-equatorial, near-circular resonances).
    NearSingular,
    /// Requested epoch is outside the routine's valid propagation range.
    OutOfRangeTime,
    /// The integrator produced a NaN/Inf state component.
    NonFinite,
}

impl std::fmt::Display for PropagationErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Decay => "decay",
            Self::NearSingular => "near-singular-geometry",
            Self::OutOfRangeTime => "out-of-range-time",
            Self::NonFinite => "non-finite-state",
        };
        write!(f, "{s}")
    }
}

/// Per-object / per-pair propagation failure (`spec.md` §4.3, §4.4, §7).
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(visibility(pub))]
pub enum PropagatorError {
    #[snafu(display("invalid element set: {source}"))]
    InvalidElementSet { source: ElementSetError },

    #[snafu(display("propagation error [{code}]: {reason}"))]
    Propagation {
        code: PropagationErrorCode,
        reason: String,
    },
}

/// Covariance-stage failure (`spec.md` §7 `NumericalFailure`).
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(visibility(pub))]
pub enum CovarianceError {
    #[snafu(display("combined covariance is not positive semi-definite (min eigenvalue {min_eigenvalue})"))]
    NotPositiveSemiDefinite { min_eigenvalue: f64 },

    #[snafu(display("isotropic sigma underflowed to {sigma}"))]
    SigmaUnderflow { sigma: f64 },
}

/// Configuration validation failure (`spec.md` §7 `ConfigError`), raised
/// before any propagation is attempted.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    #[snafu(display("window {window_s} s exceeds max_window_s {max_window_s} s"))]
    WindowTooLarge { window_s: f64, max_window_s: f64 },

    #[snafu(display("step {step_s} s must be positive"))]
    NonPositiveStep { step_s: f64 },

    #[snafu(display("{name} sigma {value} must be non-negative"))]
    NegativeSigma { name: &'static str, value: f64 },

    #[snafu(display("could not read config file {path}: {reason}"))]
    Load { path: String, reason: String },
}

/// Top-level error returned by [`crate::orchestrator::Core`] operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CoreError {
    #[snafu(display("{source}"))]
    Config { source: ConfigError },

    #[snafu(display("{source}"))]
    Propagation { source: PropagatorError },

    #[snafu(display("{source}"))]
    Numerical { source: CovarianceError },

    #[snafu(display("no event with id {event_id}"))]
    NotFound { event_id: EventId },

    #[snafu(display("catalog object {catalog_id} not found"))]
    ObjectNotInCatalog { catalog_id: u64 },

    #[snafu(display("operation cancelled"))]
    Cancelled,

    #[snafu(display("no close approach found within the configured thresholds"))]
    NoCloseApproach,
}
