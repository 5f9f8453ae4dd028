//! [`Event`] and its deterministic [`EventId`] (`spec.md` §3, §4.9).

use std::fmt;

use hifitime::Epoch;
use sha2::{Digest, Sha256};

use crate::covariance::Covariance;
use crate::pc::RiskBand;
use crate::screener::CloseApproach;

/// A 12-hex-char (upper) truncated SHA-256 digest, stable across runs with
/// identical inputs (`spec.md` §8 P8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(pub [u8; 6]);

impl EventId {
    /// `spec.md` §4.9: `SHA-256(primary_id || secondary_id || TCA || miss || Pc)`
    /// truncated to 12 hex chars (upper), i.e. the first 6 bytes of the digest.
    pub fn compute(primary_id: u64, secondary_id: u64, tca: Epoch, miss_distance_m: f64, pc: f64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(primary_id.to_be_bytes());
        hasher.update(secondary_id.to_be_bytes());
        hasher.update(tca.to_jde_utc_days().to_be_bytes());
        hasher.update(miss_distance_m.to_be_bytes());
        hasher.update(pc.to_be_bytes());
        let digest = hasher.finalize();

        let mut id = [0u8; 6];
        id.copy_from_slice(&digest[..6]);
        Self(id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Pc result attached to a [`CloseApproach`] (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEstimate {
    pub pc: f64,
    pub combined_sigma_m: f64,
    pub hard_body_radius_m: f64,
    pub risk_band: RiskBand,
}

/// A fully assessed conjunction: the geometry, the risk estimate, the
/// covariances that produced it, and its creation time (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub close_approach: CloseApproach,
    pub estimate: CollisionEstimate,
    pub primary_covariance_at_tca: Covariance,
    pub secondary_covariance_at_tca: Covariance,
    pub created_at: Epoch,
}

impl Event {
    pub fn combined_covariance(&self) -> Covariance {
        self.primary_covariance_at_tca.combine(&self.secondary_covariance_at_tca)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// P8: identical inputs yield identical event ids.
    #[test]
    fn event_id_is_stable_across_identical_inputs() {
        let tca = Epoch::from_gregorian_utc_at_midnight(2024, 3, 1);
        let a = EventId::compute(100, 200, tca, 1234.5, 4.56e-5);
        let b = EventId::compute(100, 200, tca, 1234.5, 4.56e-5);
        assert_eq!(a, b);
    }

    #[test]
    fn event_id_differs_on_different_inputs() {
        let tca = Epoch::from_gregorian_utc_at_midnight(2024, 3, 1);
        let a = EventId::compute(100, 200, tca, 1234.5, 4.56e-5);
        let b = EventId::compute(100, 201, tca, 1234.5, 4.56e-5);
        assert_ne!(a, b);
    }

    #[test]
    fn event_id_formats_as_twelve_uppercase_hex_chars() {
        let tca = Epoch::from_gregorian_utc_at_midnight(2024, 3, 1);
        let id = EventId::compute(1, 2, tca, 0.0, 0.0);
        let s = id.to_string();
        assert_eq!(s.len(), 12);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }
}
