//! Two-stage close-approach screener (`spec.md` §4.5), parallelized over
//! catalog pairs with `rayon` the way the teacher's
//! `md/opti/convert_impulsive.rs` fans a correction pass out over a batch
//! of maneuvers via `rayon::prelude::*`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use hifitime::{Epoch, Unit};
use rayon::prelude::*;

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::{ForceModelConfig, ScreeningConfig};
use crate::errors::PropagatorError;
use crate::force_model::ForceModel;
use crate::propagators::{AnalyticPropagator, NumericalPropagator};
use crate::state::State;

/// A retained close approach (`spec.md` §3).
#[derive(Debug, Clone, Copy)]
pub struct CloseApproach {
    pub primary_id: u64,
    pub secondary_id: u64,
    pub tca: Epoch,
    pub miss_distance_m: f64,
    pub relative_speed_m_s: f64,
    pub primary_state: State,
    pub secondary_state: State,
}

/// Cooperative cancellation + wall-clock deadline, checked between pairs
/// and between coarse-grid samples (`spec.md` §5).
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Outcome of a [`screen`] run: the deterministically sorted candidates,
/// and whether the run was cut short by cancellation or deadline
/// (`spec.md` §5: "partial deterministic-sorted result is returned with a
/// `Cancelled` marker").
#[derive(Debug, Clone, Default)]
pub struct ScreenResult {
    pub close_approaches: Vec<CloseApproach>,
    pub cancelled: bool,
}

/// Stage-1 analytic short-arc filter (`spec.md` §4.5): treats relative
/// motion as constant-velocity over `[0, horizon_s]` and analytically
/// minimizes `|dr(t)|`.
pub(crate) fn short_arc_filter(r1: &State, r2: &State, horizon_s: f64, screening_km: f64) -> Option<(f64, f64)> {
    let dr0 = r1.position_m - r2.position_m;
    let dv = r1.velocity_m_s - r2.velocity_m_s;
    let dv2 = dv.norm_squared();

    let t_star = if dv2 < 1e-8 {
        0.0
    } else {
        (-(dr0.dot(&dv)) / dv2).clamp(0.0, horizon_s)
    };

    let miss = (dr0 + dv * t_star).norm();
    if miss <= screening_km * 1000.0 {
        Some((t_star, miss))
    } else {
        None
    }
}

/// Stage-2 numerical refinement (`spec.md` §4.5): dense-grid sampling
/// followed by a bracketed golden-section minimization around the grid
/// minimum.
pub(crate) fn numerical_refine(
    primary: &AnalyticPropagator,
    secondary: &AnalyticPropagator,
    reference_epoch: Epoch,
    horizon_s: f64,
    coarse_steps: usize,
    force_model: &ForceModel,
    token: &CancellationToken,
) -> Result<Option<CloseApproach>, PropagatorError> {
    let n = coarse_steps.max(2);
    let dense_step_s = horizon_s / (n as f64 - 1.0);

    let numerical = NumericalPropagator::new(*force_model);
    let primary_base = primary.propagate(reference_epoch)?;
    let secondary_base = secondary.propagate(reference_epoch)?;

    let mut best_index = 0usize;
    let mut best_distance = f64::INFINITY;
    let mut grid_states: Vec<(State, State)> = Vec::with_capacity(n);

    for i in 0..n {
        if token.is_cancelled() {
            return Ok(None);
        }
        let t_s = i as f64 * dense_step_s;
        let epoch = reference_epoch + t_s * Unit::Second;

        let p_state = numerical.propagate(&primary_base, epoch)?;
        let s_state = numerical.propagate(&secondary_base, epoch)?;

        let distance = (p_state.position_m - s_state.position_m).norm();
        if distance < best_distance {
            best_distance = distance;
            best_index = i;
        }
        grid_states.push((p_state, s_state));
    }

    let t_idx_s = best_index as f64 * dense_step_s;
    let bracket_lo = (t_idx_s - horizon_s / 10.0).max(0.0);
    let bracket_hi = (t_idx_s + horizon_s / 10.0).min(horizon_s);

    let distance_at = |t_s: f64| -> Result<(f64, State, State), PropagatorError> {
        let epoch = reference_epoch + t_s * Unit::Second;
        let p_state = numerical.propagate(&primary_base, epoch)?;
        let s_state = numerical.propagate(&secondary_base, epoch)?;
        let distance = (p_state.position_m - s_state.position_m).norm();
        Ok((distance, p_state, s_state))
    };

    let (best_t_s, best_p, best_s, best_miss) =
        golden_section_minimize(bracket_lo, bracket_hi, 0.1, distance_at)?;
    let _ = best_t_s;

    let relative_speed_m_s = (best_p.velocity_m_s - best_s.velocity_m_s).norm();

    Ok(Some(CloseApproach {
        primary_id: 0,
        secondary_id: 0,
        tca: best_p.epoch,
        miss_distance_m: best_miss,
        relative_speed_m_s,
        primary_state: best_p,
        secondary_state: best_s,
    }))
}

/// Runs both screening stages for a single pair, for
/// [`crate::orchestrator::Core::assess`]: stage 1 as a cheap reject, stage
/// 2 as the authoritative TCA/miss-distance answer.
#[allow(clippy::too_many_arguments)]
pub(crate) fn assess_pair(
    primary_id: u64,
    secondary_id: u64,
    primary_prop: &AnalyticPropagator,
    secondary_prop: &AnalyticPropagator,
    reference_epoch: Epoch,
    horizon_s: f64,
    coarse_steps: usize,
    screening_km: f64,
    force_model: &ForceModel,
) -> Result<Option<CloseApproach>, PropagatorError> {
    let r1 = primary_prop.propagate(reference_epoch)?;
    let r2 = secondary_prop.propagate(reference_epoch)?;

    if short_arc_filter(&r1, &r2, horizon_s, screening_km).is_none() {
        return Ok(None);
    }

    let token = CancellationToken::new();
    let refined = numerical_refine(
        primary_prop,
        secondary_prop,
        reference_epoch,
        horizon_s,
        coarse_steps,
        force_model,
        &token,
    )?;

    Ok(refined.map(|mut candidate| {
        candidate.primary_id = primary_id;
        candidate.secondary_id = secondary_id;
        candidate
    }))
}

/// Golden-section scalar minimization of `f(t)` over `[lo, hi]` to within
/// `tol_s`, the way `spec.md` §4.5 specifies ("scalar-minimize distance
/// ... tolerance is 0.1 s").
fn golden_section_minimize<F>(lo: f64, hi: f64, tol_s: f64, mut f: F) -> Result<(f64, State, State, f64), PropagatorError>
where
    F: FnMut(f64) -> Result<(f64, State, State), PropagatorError>,
{
    const INV_PHI: f64 = 0.618_033_988_749_895;

    let mut a = lo;
    let mut b = hi;
    if (b - a).abs() < tol_s {
        let (distance, p, s) = f((a + b) / 2.0)?;
        return Ok(((a + b) / 2.0, p, s, distance));
    }

    let mut c = b - (b - a) * INV_PHI;
    let mut d = a + (b - a) * INV_PHI;
    let (mut fc, mut pc_state, mut sc_state) = f(c)?;
    let (mut fd, mut pd_state, mut sd_state) = f(d)?;

    while (b - a).abs() > tol_s {
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            pd_state = pc_state;
            sd_state = sc_state;
            c = b - (b - a) * INV_PHI;
            let (new_fc, new_p, new_s) = f(c)?;
            fc = new_fc;
            pc_state = new_p;
            sc_state = new_s;
        } else {
            a = c;
            c = d;
            fc = fd;
            pc_state = pd_state;
            sc_state = sd_state;
            d = a + (b - a) * INV_PHI;
            let (new_fd, new_p, new_s) = f(d)?;
            fd = new_fd;
            pd_state = new_p;
            sd_state = new_s;
        }
    }

    if fc < fd {
        Ok((c, pc_state, sc_state, fc))
    } else {
        Ok((d, pd_state, sd_state, fd))
    }
}

/// Deterministically partitions `(primary, secondary)` pairs into lanes by
/// a hash of the pair id, so thread assignment is fixed for a given pair
/// set regardless of rayon's runtime scheduling (`spec.md` §5, §9).
fn pair_lane(primary_id: u64, secondary_id: u64, lanes: usize) -> usize {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    (primary_id, secondary_id).hash(&mut hasher);
    (hasher.finish() % lanes as u64) as usize
}

/// Screens every `(primary, secondary)` pair in `catalog` over
/// `[reference_epoch, reference_epoch + horizon_s]`, per `spec.md` §4.5.
#[allow(clippy::too_many_arguments)]
pub fn screen(
    catalog: &Catalog,
    reference_epoch: Epoch,
    horizon_s: f64,
    screening: &ScreeningConfig,
    force_model_config: ForceModelConfig,
    token: &CancellationToken,
    deadline: Option<Instant>,
) -> ScreenResult {
    let lanes = rayon::current_num_threads().max(1);
    let force_model = ForceModel::new(force_model_config);

    let primaries: Vec<&CatalogEntry> = catalog.primaries().collect();
    let secondaries: Vec<&CatalogEntry> = catalog.secondaries().collect();

    let pairs: Vec<(&CatalogEntry, &CatalogEntry)> = primaries
        .iter()
        .flat_map(|p| secondaries.iter().map(move |s| (*p, *s)))
        .collect();

    let mut lane_buckets: Vec<Vec<(u64, u64)>> = vec![Vec::new(); lanes];
    for (p, s) in &pairs {
        lane_buckets[pair_lane(p.id(), s.id(), lanes)].push((p.id(), s.id()));
    }

    let was_cancelled = Arc::new(AtomicBool::new(false));

    let results: Vec<CloseApproach> = lane_buckets
        .into_par_iter()
        .flat_map_iter(|lane_pairs| {
            let mut local: Vec<CloseApproach> = Vec::new();
            for (primary_id, secondary_id) in lane_pairs {
                if token.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d) {
                    was_cancelled.store(true, Ordering::Relaxed);
                    break;
                }

                let Some(primary_entry) = catalog.get(primary_id) else { continue };
                let Some(secondary_entry) = catalog.get(secondary_id) else { continue };

                let Ok(primary_prop) = AnalyticPropagator::new(primary_entry.element_set.clone()) else { continue };
                let Ok(secondary_prop) = AnalyticPropagator::new(secondary_entry.element_set.clone()) else { continue };

                let Ok(r1) = primary_prop.propagate(reference_epoch) else { continue };
                let Ok(r2) = secondary_prop.propagate(reference_epoch) else { continue };

                if short_arc_filter(&r1, &r2, horizon_s, screening.screening_km).is_none() {
                    continue;
                }

                let refined = numerical_refine(
                    &primary_prop,
                    &secondary_prop,
                    reference_epoch,
                    horizon_s,
                    screening.coarse_steps,
                    &force_model,
                    token,
                );

                if let Ok(Some(mut candidate)) = refined {
                    candidate.primary_id = primary_id;
                    candidate.secondary_id = secondary_id;
                    if candidate.miss_distance_m <= screening.risk_km * 1000.0 {
                        local.push(candidate);
                    }
                }
            }
            local.into_iter()
        })
        .collect();

    let mut close_approaches = results;
    // `spec.md` §4.5: ties on miss distance break on (primary id, secondary id).
    close_approaches.sort_by(|a, b| {
        a.miss_distance_m
            .partial_cmp(&b.miss_distance_m)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.primary_id.cmp(&b.primary_id))
            .then_with(|| a.secondary_id.cmp(&b.secondary_id))
    });

    ScreenResult {
        close_approaches,
        cancelled: was_cancelled.load(Ordering::Relaxed) || token.is_cancelled(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Tags;
    use crate::element_set::ElementSet;
    use crate::linalg::Vector3;

    const ISS_LINE1: &str = "1 25544U 98067A   20001.50000000  .00001234  00000-0  12345-4 0  9999";
    const ISS_LINE2: &str = "2 25544  51.6333 123.4560 0007763  90.0000 270.0000 15.49289811  5678";

    fn sample_state(offset_x_m: f64) -> State {
        State::new(
            Vector3::new(7_000_000.0 + offset_x_m, 0.0, 0.0),
            Vector3::new(0.0, 7500.0, 0.0),
            Epoch::from_gregorian_utc_at_midnight(2024, 1, 1),
        )
    }

    /// P10: with pure constant-velocity relative motion (zero force
    /// model), the stage-1 analytic TCA matches the grid minimum.
    #[test]
    fn short_arc_filter_finds_head_on_closure() {
        let r1 = sample_state(0.0);
        let mut r2 = sample_state(0.0);
        r2.position_m.x += 10_000.0;
        r2.velocity_m_s.y = -7500.0;

        let result = short_arc_filter(&r1, &r2, 3600.0, 50.0);
        assert!(result.is_some());
        let (_, miss) = result.unwrap();
        assert!(miss < 10_000.0);
    }

    #[test]
    fn short_arc_filter_rejects_far_pairs() {
        let r1 = sample_state(0.0);
        let mut r2 = sample_state(0.0);
        r2.position_m.x += 10_000_000.0;

        assert!(short_arc_filter(&r1, &r2, 3600.0, 50.0).is_none());
    }

    /// P9: screener output is deterministically ordered.
    #[test]
    fn screen_orders_results_by_miss_then_ids() {
        let mut catalog = Catalog::new();
        let es1 = ElementSet::parse(1, "PRIMARY", ISS_LINE1, ISS_LINE2).unwrap();
        let mut es2 = es1.clone();
        es2.catalog_id = 2;
        catalog.insert(crate::catalog::CatalogEntry::new(
            es1,
            Tags {
                primary: true,
                ..Default::default()
            },
        ));
        catalog.insert(crate::catalog::CatalogEntry::new(es2, Tags::default()));

        let reference_epoch = Epoch::from_gregorian_utc_at_midnight(2020, 1, 1);
        let result = screen(
            &catalog,
            reference_epoch,
            600.0,
            &ScreeningConfig {
                coarse_steps: 10,
                ..Default::default()
            },
            ForceModelConfig::default(),
            &CancellationToken::new(),
            None,
        );

        let mut sorted = result.close_approaches.clone();
        sorted.sort_by(|a, b| {
            a.miss_distance_m
                .partial_cmp(&b.miss_distance_m)
                .unwrap()
                .then_with(|| a.primary_id.cmp(&b.primary_id))
        });
        assert_eq!(
            result
                .close_approaches
                .iter()
                .map(|c| c.miss_distance_m)
                .collect::<Vec<_>>(),
            sorted.iter().map(|c| c.miss_distance_m).collect::<Vec<_>>()
        );
    }
}
