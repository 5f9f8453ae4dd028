//! Collision probability estimation (`spec.md` §4.7), grounded on
//! `original_source/src/ssa_engine/risk/pc.py` for both the monotone
//! surrogate and the supplemental Alfriend-style upper bound.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::covariance::isotropic_sigma;
use crate::linalg::Matrix3;

/// Risk classification derived from `Pc` (`spec.md` §4.7). `Display`/
/// `FromStr` mirror the teacher pack's `RiskLevel` string-enum idiom so the
/// band round-trips cleanly through the CDM's `RISK_LEVEL` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Critical,
    High,
    Medium,
    Low,
}

impl RiskBand {
    /// `spec.md` §4.7: CRITICAL >= 1e-3, HIGH >= 1e-4, MEDIUM >= 1e-6, else LOW.
    pub fn from_pc(pc: f64) -> Self {
        if pc >= 1e-3 {
            Self::Critical
        } else if pc >= 1e-4 {
            Self::High
        } else if pc >= 1e-6 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        };
        write!(f, "{s}")
    }
}

impl FromStr for RiskBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CRITICAL" => Ok(Self::Critical),
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            other => Err(format!("unrecognized risk level: {other}")),
        }
    }
}

/// The monotone Pc surrogate (`spec.md` §4.7): `Pc = clamp(B * S, 0, 1)`
/// with `B = exp(-d^2 / (2*sigma^2))` and `S = min(1, (R_hbr/sigma)^2)`.
pub fn collision_probability(miss_distance_m: f64, position_covariance_m2: &Matrix3<f64>, hard_body_radius_m: f64) -> f64 {
    let sigma = isotropic_sigma(position_covariance_m2);
    let b = (-(miss_distance_m * miss_distance_m) / (2.0 * sigma * sigma)).exp();
    let s = (hard_body_radius_m / sigma).powi(2).min(1.0);
    (b * s).clamp(0.0, 1.0)
}

/// Supplemental Alfriend-style upper bound on Pc, ported from
/// `original_source/src/ssa_engine/risk/pc.py`. Not wired into
/// [`collision_probability`]; exposed as an independent, more conservative
/// estimator per `DESIGN.md`'s Open Question decision on Pc fidelity.
pub fn alfriend_upper_bound_pc(miss_distance_m: f64, position_covariance_m2: &Matrix3<f64>, hard_body_radius_m: f64) -> f64 {
    let sigma = isotropic_sigma(position_covariance_m2);
    let ratio = hard_body_radius_m / sigma;
    let exponent = -(miss_distance_m * miss_distance_m) / (2.0 * sigma * sigma);
    (ratio * ratio * exponent.exp()).clamp(0.0, 1.0)
}
