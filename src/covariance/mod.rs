//! 6x6 state covariance: initialization, linear propagation, combination at
//! TCA (`spec.md` §4.6), grounded on `original_source/src/ssa/ca/covariance.py`.

use crate::config::CovarianceConfig;
use crate::errors::{CovarianceError, NotPositiveSemiDefiniteSnafu, SigmaUnderflowSnafu};
use crate::linalg::{Matrix3, Matrix6};

/// A 6x6 symmetric positive-semidefinite covariance over `(x,y,z,vx,vy,vz)`,
/// always in SI units (m, m/s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Covariance {
    pub matrix: Matrix6<f64>,
}

const DIAGONAL_FLOOR: f64 = 1e-12;

impl Covariance {
    /// Diagonal initialization from position/velocity sigmas
    /// (`spec.md` §4.6).
    pub fn initial(sigma_pos_m: f64, sigma_vel_ms: f64) -> Self {
        let mut m = Matrix6::zeros();
        for i in 0..3 {
            m[(i, i)] = sigma_pos_m * sigma_pos_m;
        }
        for i in 3..6 {
            m[(i, i)] = sigma_vel_ms * sigma_vel_ms;
        }
        Self { matrix: m }
    }

    pub fn from_config(config: &CovarianceConfig) -> Self {
        Self::initial(config.sigma_pos_init_km * 1000.0, config.sigma_vel_init_kms * 1000.0)
    }

    /// Linear propagation over `dt_s` with a constant-velocity transition
    /// `F = [[I, dt*I], [0, I]]` and diagonal process noise `Q`
    /// (`spec.md` §4.6).
    pub fn propagate(&self, dt_s: f64, sigma_pos_proc_m: f64, sigma_vel_proc_ms: f64) -> Self {
        let mut f = Matrix6::identity();
        for i in 0..3 {
            f[(i, i + 3)] = dt_s;
        }

        let propagated = f * self.matrix * f.transpose();

        let q_scale = dt_s.max(1.0);
        let mut q = Matrix6::zeros();
        for i in 0..3 {
            q[(i, i)] = sigma_pos_proc_m * sigma_pos_proc_m * q_scale;
        }
        for i in 3..6 {
            q[(i, i)] = sigma_vel_proc_ms * sigma_vel_proc_ms * q_scale;
        }

        Self {
            matrix: symmetrize_and_floor(propagated + q),
        }
    }

    pub fn propagate_from_config(&self, dt_s: f64, config: &CovarianceConfig) -> Self {
        self.propagate(dt_s, config.sigma_pos_proc_km * 1000.0, config.sigma_vel_proc_kms * 1000.0)
    }

    /// Combination of two independent covariances at TCA: `P_rel = P1 + P2`
    /// (`spec.md` §4.6).
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            matrix: symmetrize_and_floor(self.matrix + other.matrix),
        }
    }

    pub fn position_block(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).clone_owned()
    }

    /// `spec.md` §4.6: `3 * sqrt(trace(P_pos) / 3)`.
    pub fn risk_radius_m(&self) -> f64 {
        3.0 * (self.position_block().trace() / 3.0).sqrt()
    }

    /// P6: the position block has non-negative eigenvalues.
    pub fn is_position_psd(&self) -> bool {
        self.position_block().symmetric_eigenvalues().iter().all(|ev| *ev >= -1e-9)
    }

    /// `spec.md` §7 `NumericalFailure`: not PSD after symmetrization, or
    /// the isotropic sigma underflows.
    pub fn validate(&self) -> Result<(), CovarianceError> {
        if !self.is_position_psd() {
            let min_eigenvalue = self.position_block().symmetric_eigenvalues().min();
            return NotPositiveSemiDefiniteSnafu { min_eigenvalue }.fail();
        }
        let sigma = isotropic_sigma(&self.position_block());
        if sigma < 1e-9 {
            return SigmaUnderflowSnafu { sigma }.fail();
        }
        Ok(())
    }
}

fn symmetrize_and_floor(m: Matrix6<f64>) -> Matrix6<f64> {
    let mut sym = (m + m.transpose()) * 0.5;
    for i in 0..6 {
        sym[(i, i)] += DIAGONAL_FLOOR;
    }
    sym
}

/// `spec.md` §4.7: `sigma = sqrt(trace(P_pos) / 3)`, floored at 1e-6 m.
pub fn isotropic_sigma(position_block: &Matrix3<f64>) -> f64 {
    (position_block.trace() / 3.0).sqrt().max(1e-6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_covariance_is_diagonal_and_psd() {
        let cov = Covariance::initial(100.0, 0.001);
        assert!(cov.is_position_psd());
        assert_eq!(cov.matrix[(0, 0)], 100.0 * 100.0);
        assert_eq!(cov.matrix[(0, 1)], 0.0);
    }

    /// P6: combination of two propagated covariances stays PSD.
    #[test]
    fn propagate_and_combine_stays_psd() {
        let a = Covariance::initial(100.0, 0.001).propagate(3600.0, 50.0, 0.0001);
        let b = Covariance::initial(100.0, 0.001).propagate(3600.0, 50.0, 0.0001);
        let combined = a.combine(&b);
        assert!(combined.is_position_psd());
        assert!(combined.risk_radius_m() > 0.0);
    }

    #[test]
    fn matrix_stays_symmetric_after_propagation() {
        let cov = Covariance::initial(100.0, 0.001).propagate(120.0, 50.0, 0.0001);
        for i in 0..6 {
            for j in 0..6 {
                assert!((cov.matrix[(i, j)] - cov.matrix[(j, i)]).abs() < 1e-12);
            }
        }
    }
}
