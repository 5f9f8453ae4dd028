//! Numerical adaptive propagator (`spec.md` §4.4): a generic embedded
//! Runge-Kutta core driven by a [`Tableau`], the way the teacher's
//! `propagators` crate keeps the stepping logic generic over a tableau
//! type and ships concrete tableaus (`RK4Fixed`, `RSSStep`, `RSSCartesian`)
//! as plain data (`tests/stat_od/multi_body.rs`'s
//! `nyx::propagators::{PropOpts, RK4Fixed}`).
//!
//! The default tableau is Fehlberg's classical 8(7) 13-stage pair
//! (`spec.md` §4.4's "adaptive high-order explicit integrator of 8th
//! order"), with Dormand-Prince 5(4) kept available as a cheaper
//! lower-order alternative for the same generic stepping core.

use hifitime::{Epoch, Unit};

use crate::errors::{PropagationErrorCode, PropagatorError};
use crate::force_model::ForceModel;
use crate::linalg::Vector3;
use crate::state::State;
use crate::time::jd_from_utc;

/// An explicit embedded Runge-Kutta tableau: `stages` row-major strictly
/// lower-triangular coefficients `a[i][j]`, `nodes` the `c_i`, `b_high`/
/// `b_low` the two solution weight sets whose difference estimates local
/// error.
pub trait Tableau {
    const STAGES: usize;
    const ORDER: u32;

    fn nodes() -> &'static [f64];
    fn matrix() -> &'static [&'static [f64]];
    fn b_high() -> &'static [f64];
    fn b_low() -> &'static [f64];
}

/// Dormand-Prince 5(4), the same coefficients used by MATLAB's `ode45` and
/// SciPy's `RK45`.
pub struct DormandPrince54;

impl Tableau for DormandPrince54 {
    const STAGES: usize = 7;
    const ORDER: u32 = 5;

    fn nodes() -> &'static [f64] {
        &[0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0]
    }

    fn matrix() -> &'static [&'static [f64]] {
        &[
            &[],
            &[1.0 / 5.0],
            &[3.0 / 40.0, 9.0 / 40.0],
            &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
            &[19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0],
            &[9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0],
            &[35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
        ]
    }

    fn b_high() -> &'static [f64] {
        &[35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0, 0.0]
    }

    fn b_low() -> &'static [f64] {
        &[
            5179.0 / 57600.0,
            0.0,
            7571.0 / 16695.0,
            393.0 / 640.0,
            -92097.0 / 339_200.0,
            187.0 / 2100.0,
            1.0 / 40.0,
        ]
    }
}

/// Fehlberg's 8(7) 13-stage embedded pair (Fehlberg, NASA TR R-287, 1968):
/// an eighth-order solution with a seventh-order embedded error estimate,
/// the classical "RKF78" table. This is the default tableau, satisfying
/// `spec.md` §4.4's eighth-order requirement.
pub struct Fehlberg78;

impl Tableau for Fehlberg78 {
    const STAGES: usize = 13;
    const ORDER: u32 = 8;

    fn nodes() -> &'static [f64] {
        &[
            0.0,
            2.0 / 27.0,
            1.0 / 9.0,
            1.0 / 6.0,
            5.0 / 12.0,
            1.0 / 2.0,
            5.0 / 6.0,
            1.0 / 6.0,
            2.0 / 3.0,
            1.0 / 3.0,
            1.0,
            0.0,
            1.0,
        ]
    }

    fn matrix() -> &'static [&'static [f64]] {
        &[
            &[],
            &[2.0 / 27.0],
            &[1.0 / 36.0, 1.0 / 12.0],
            &[1.0 / 24.0, 0.0, 1.0 / 8.0],
            &[5.0 / 12.0, 0.0, -25.0 / 16.0, 25.0 / 16.0],
            &[1.0 / 20.0, 0.0, 0.0, 1.0 / 4.0, 1.0 / 5.0],
            &[-25.0 / 108.0, 0.0, 0.0, 125.0 / 108.0, -65.0 / 27.0, 125.0 / 54.0],
            &[31.0 / 300.0, 0.0, 0.0, 0.0, 61.0 / 225.0, -2.0 / 9.0, 13.0 / 900.0],
            &[2.0, 0.0, 0.0, -53.0 / 6.0, 704.0 / 45.0, -107.0 / 9.0, 67.0 / 90.0, 3.0],
            &[
                -91.0 / 108.0,
                0.0,
                0.0,
                23.0 / 108.0,
                -976.0 / 135.0,
                311.0 / 54.0,
                -19.0 / 60.0,
                17.0 / 6.0,
                -1.0 / 12.0,
            ],
            &[
                2383.0 / 4100.0,
                0.0,
                0.0,
                -341.0 / 164.0,
                4496.0 / 1025.0,
                -301.0 / 82.0,
                2133.0 / 4100.0,
                45.0 / 82.0,
                45.0 / 164.0,
                18.0 / 41.0,
            ],
            &[
                3.0 / 205.0,
                0.0,
                0.0,
                0.0,
                0.0,
                -6.0 / 41.0,
                -3.0 / 205.0,
                -3.0 / 41.0,
                3.0 / 41.0,
                6.0 / 41.0,
                0.0,
            ],
            &[
                -1777.0 / 4100.0,
                0.0,
                0.0,
                -341.0 / 164.0,
                4496.0 / 1025.0,
                -289.0 / 82.0,
                2193.0 / 4100.0,
                51.0 / 82.0,
                33.0 / 164.0,
                12.0 / 41.0,
                0.0,
                1.0,
            ],
        ]
    }

    fn b_high() -> &'static [f64] {
        &[
            41.0 / 840.0,
            0.0,
            0.0,
            0.0,
            0.0,
            34.0 / 105.0,
            9.0 / 35.0,
            9.0 / 35.0,
            9.0 / 280.0,
            9.0 / 280.0,
            41.0 / 840.0,
            0.0,
            0.0,
        ]
    }

    fn b_low() -> &'static [f64] {
        &[
            41.0 / 840.0,
            0.0,
            0.0,
            0.0,
            0.0,
            34.0 / 105.0,
            9.0 / 35.0,
            9.0 / 35.0,
            9.0 / 280.0,
            9.0 / 280.0,
            0.0,
            0.0,
            41.0 / 840.0,
        ]
    }
}

/// Cartesian state-vector derivative: `[r; v]` stacked as 6 components.
type Derivative = [f64; 6];

fn rhs(y: &Derivative, jd: f64, fr: f64, force_model: &ForceModel) -> Derivative {
    let r = Vector3::new(y[0], y[1], y[2]);
    let v = Vector3::new(y[3], y[4], y[5]);
    let a = force_model.acceleration(&r, &v, jd, fr);
    [v.x, v.y, v.z, a.x, a.y, a.z]
}

fn axpy(out: &mut Derivative, coeff: f64, rhs: &Derivative) {
    for i in 0..6 {
        out[i] += coeff * rhs[i];
    }
}

/// Adaptive-step embedded Runge-Kutta propagator over the configured
/// [`ForceModel`], generic over a [`Tableau`] (default [`Fehlberg78`]).
pub struct NumericalPropagator<T: Tableau = Fehlberg78> {
    force_model: ForceModel,
    rtol: f64,
    atol: f64,
    min_step_s: f64,
    max_step_s: f64,
    _tableau: std::marker::PhantomData<T>,
}

impl<T: Tableau> NumericalPropagator<T> {
    pub fn new(force_model: ForceModel) -> Self {
        Self {
            force_model,
            rtol: 1e-10,
            atol: 1e-10,
            min_step_s: 1e-3,
            max_step_s: 3600.0,
            _tableau: std::marker::PhantomData,
        }
    }

    pub fn with_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    pub fn with_step_bounds(mut self, min_step_s: f64, max_step_s: f64) -> Self {
        self.min_step_s = min_step_s;
        self.max_step_s = max_step_s;
        self
    }

    /// Integrates `from` forward (or backward) to `to`, step-doubling/
    /// halving on the embedded error estimate. `spec.md` §4.4: on failure,
    /// the best state reached before the failure is still meaningful to
    /// the caller, so errors carry `PropagationErrorCode` rather than
    /// discarding progress silently.
    pub fn propagate(&self, from: &State, to: Epoch) -> Result<State, PropagatorError> {
        let total_s = (to - from.epoch).to_seconds();
        if total_s == 0.0 {
            return Ok(*from);
        }
        let direction = total_s.signum();

        let mut y: Derivative = [
            from.position_m.x,
            from.position_m.y,
            from.position_m.z,
            from.velocity_m_s.x,
            from.velocity_m_s.y,
            from.velocity_m_s.z,
        ];
        let mut elapsed_s = 0.0_f64;
        let mut step_s = direction * (self.max_step_s.min(total_s.abs())).max(self.min_step_s);

        while elapsed_s.abs() < total_s.abs() {
            if step_s.abs() > (total_s.abs() - elapsed_s.abs()) {
                step_s = direction * (total_s.abs() - elapsed_s.abs());
            }

            let t_epoch = from.epoch + elapsed_s * Unit::Second;
            let (jd, fr) = jd_from_utc(t_epoch);

            let (y_high, y_low) = self.step(&y, jd, fr, step_s);

            let err = embedded_error(&y_high, &y_low, self.rtol, self.atol);

            if err <= 1.0 || step_s.abs() <= self.min_step_s {
                y = y_high;
                elapsed_s += step_s;

                if !y.iter().all(|v| v.is_finite()) {
                    return Err(PropagatorError::Propagation {
                        code: PropagationErrorCode::NonFinite,
                        reason: "integrator produced a non-finite state".to_string(),
                    });
                }

                let grow = (0.9 * err.powf(-1.0 / (T::ORDER as f64))).clamp(0.2, 5.0);
                step_s = (step_s * grow).clamp(-self.max_step_s, self.max_step_s);
                if step_s.abs() < self.min_step_s {
                    step_s = direction * self.min_step_s;
                }
            } else {
                let shrink = (0.9 * err.powf(-1.0 / (T::ORDER as f64))).clamp(0.2, 1.0);
                step_s *= shrink;
                if step_s.abs() < self.min_step_s {
                    return Err(PropagatorError::Propagation {
                        code: PropagationErrorCode::NearSingular,
                        reason: "step size collapsed below the configured floor".to_string(),
                    });
                }
            }
        }

        let position_m = Vector3::new(y[0], y[1], y[2]);
        let velocity_m_s = Vector3::new(y[3], y[4], y[5]);
        let state = State::new(position_m, velocity_m_s, to);

        if !state.is_physical() {
            return Err(PropagatorError::Propagation {
                code: PropagationErrorCode::Decay,
                reason: "integrated state is sub-surface or non-finite".to_string(),
            });
        }

        Ok(state)
    }

    fn step(&self, y0: &Derivative, jd: f64, fr: f64, h: f64) -> (Derivative, Derivative) {
        let nodes = T::nodes();
        let matrix = T::matrix();
        let mut k: Vec<Derivative> = Vec::with_capacity(T::STAGES);

        for stage in 0..T::STAGES {
            let mut yi = *y0;
            for (j, a_ij) in matrix[stage].iter().enumerate() {
                axpy(&mut yi, h * a_ij, &k[j]);
            }
            let dt_frac = nodes[stage] * h / 86_400.0;
            k.push(rhs(&yi, jd, fr + dt_frac, &self.force_model));
        }

        let mut y_high = *y0;
        let mut y_low = *y0;
        for (i, k_i) in k.iter().enumerate() {
            axpy(&mut y_high, h * T::b_high()[i], k_i);
            axpy(&mut y_low, h * T::b_low()[i], k_i);
        }

        (y_high, y_low)
    }
}

fn embedded_error(y_high: &Derivative, y_low: &Derivative, rtol: f64, atol: f64) -> f64 {
    let mut sum_sq = 0.0;
    for i in 0..6 {
        let scale = atol + rtol * y_high[i].abs().max(y_low[i].abs());
        let e = (y_high[i] - y_low[i]) / scale;
        sum_sq += e * e;
    }
    (sum_sq / 6.0).sqrt().max(1e-300)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForceModelConfig;
    use hifitime::Epoch;

    fn circular_leo_state() -> State {
        let r_mag = 7_000_000.0_f64;
        let v_mag = (crate::force_model::MU_EARTH / r_mag).sqrt();
        State::new(
            Vector3::new(r_mag, 0.0, 0.0),
            Vector3::new(0.0, v_mag, 0.0),
            Epoch::from_gregorian_utc_at_midnight(2020, 1, 1),
        )
    }

    /// P1: two-body-only propagation over one orbit roughly preserves
    /// orbital radius (circular orbit, no perturbations), on the default
    /// eighth-order tableau.
    #[test]
    fn two_body_only_preserves_radius() {
        let force_model = ForceModel::new(ForceModelConfig {
            enable_perturbations: false,
            use_srp: false,
            ..Default::default()
        });
        let propagator = NumericalPropagator::<Fehlberg78>::new(force_model);
        let from = circular_leo_state();
        let period_s = 2.0 * std::f64::consts::PI * (from.position_m.norm().powi(3) / crate::force_model::MU_EARTH).sqrt();

        let to = from.epoch + period_s * Unit::Second;
        let result = propagator.propagate(&from, to).unwrap();

        let r0 = from.position_m.norm();
        let r1 = result.position_m.norm();
        assert!((r1 - r0).abs() / r0 < 1e-5, "radius drifted by {}", (r1 - r0).abs() / r0);
    }

    /// Same P1 check on the lower-order Dormand-Prince 5(4) tableau, to
    /// confirm the generic stepping core behaves consistently across
    /// tableaus.
    #[test]
    fn two_body_only_preserves_radius_dp54() {
        let force_model = ForceModel::new(ForceModelConfig {
            enable_perturbations: false,
            use_srp: false,
            ..Default::default()
        });
        let propagator = NumericalPropagator::<DormandPrince54>::new(force_model);
        let from = circular_leo_state();
        let period_s = 2.0 * std::f64::consts::PI * (from.position_m.norm().powi(3) / crate::force_model::MU_EARTH).sqrt();

        let to = from.epoch + period_s * Unit::Second;
        let result = propagator.propagate(&from, to).unwrap();

        let r0 = from.position_m.norm();
        let r1 = result.position_m.norm();
        assert!((r1 - r0).abs() / r0 < 1e-5, "radius drifted by {}", (r1 - r0).abs() / r0);
    }

    #[test]
    fn zero_duration_returns_input_state() {
        let force_model = ForceModel::new(ForceModelConfig::default());
        let propagator = NumericalPropagator::<DormandPrince54>::new(force_model);
        let from = circular_leo_state();
        let result = propagator.propagate(&from, from.epoch).unwrap();
        assert_eq!(result.position_m, from.position_m);
    }
}
