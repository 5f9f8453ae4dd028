//! Core orchestrator (`spec.md` §4.9): `assess`/`screen`/`get_event` over
//! a [`Catalog`] snapshot, with a mutex-serialized event store as the
//! only mutable shared state (`spec.md` §5).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use snafu::ResultExt;

use crate::catalog::Catalog;
use crate::config::{CoreConfig, CovarianceConfig};
use crate::covariance::Covariance;
use crate::errors::{
    ConfigSnafu, CoreError, NoCloseApproachSnafu, NotFoundSnafu, NumericalSnafu, ObjectNotInCatalogSnafu,
    PropagationSnafu,
};
use crate::event::{CollisionEstimate, Event, EventId};
use crate::force_model::ForceModel;
use crate::interfaces::{Clock, EventSink, NullEventSink, SystemClock};
use crate::pc::{collision_probability, RiskBand};
use crate::propagators::AnalyticPropagator;
use crate::screener::{self, CancellationToken, ScreenResult};

/// Sigma bundle an `assess` call may override from [`CovarianceConfig`]
/// defaults (`spec.md` §4.9).
#[derive(Debug, Clone, Copy)]
pub struct AssessSigmas {
    pub sigma_pos_init_m: f64,
    pub sigma_vel_init_ms: f64,
    pub sigma_pos_proc_m: f64,
    pub sigma_vel_proc_ms: f64,
}

impl AssessSigmas {
    pub fn from_config(config: &CovarianceConfig) -> Self {
        Self {
            sigma_pos_init_m: config.sigma_pos_init_km * 1000.0,
            sigma_vel_init_ms: config.sigma_vel_init_kms * 1000.0,
            sigma_pos_proc_m: config.sigma_pos_proc_km * 1000.0,
            sigma_vel_proc_ms: config.sigma_vel_proc_kms * 1000.0,
        }
    }
}

/// Owns a catalog snapshot, configuration, and the event store for one
/// core lifetime. `spec.md` §5: "the Catalog is immutable during a run
/// ... the event store is the only mutable shared resource and is
/// serialized by a single mutex."
pub struct Core {
    catalog: Catalog,
    config: CoreConfig,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink + Send + Sync>,
    events: Mutex<HashMap<EventId, Event>>,
}

impl Core {
    pub fn new(catalog: Catalog, config: CoreConfig) -> Self {
        Self {
            catalog,
            config,
            clock: Arc::new(SystemClock),
            sink: Arc::new(NullEventSink),
            events: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink + Send + Sync>) -> Self {
        self.sink = sink;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// `spec.md` §4.9 `assess`: two-stage search for one pair, covariance
    /// propagation to TCA, Pc, and event-store insertion.
    pub fn assess(
        &self,
        primary_id: u64,
        secondary_id: u64,
        window_s: f64,
        step_s: f64,
        sigmas: AssessSigmas,
        hbr_m: f64,
    ) -> Result<Event, CoreError> {
        self.config.screening.validate(window_s, step_s).context(ConfigSnafu)?;

        let primary_entry = self
            .catalog
            .get(primary_id)
            .ok_or_else(|| ObjectNotInCatalogSnafu { catalog_id: primary_id }.build())?;
        let secondary_entry = self
            .catalog
            .get(secondary_id)
            .ok_or_else(|| ObjectNotInCatalogSnafu { catalog_id: secondary_id }.build())?;

        let primary_prop = AnalyticPropagator::new(primary_entry.element_set.clone()).context(PropagationSnafu)?;
        let secondary_prop = AnalyticPropagator::new(secondary_entry.element_set.clone()).context(PropagationSnafu)?;

        let reference_epoch = self.clock.now();
        let force_model = ForceModel::new(self.config.force_model);

        let close_approach = screener::assess_pair(
            primary_id,
            secondary_id,
            &primary_prop,
            &secondary_prop,
            reference_epoch,
            window_s,
            self.config.screening.coarse_steps,
            self.config.screening.screening_km,
            &force_model,
        )
        .context(PropagationSnafu)?
        .ok_or_else(|| NoCloseApproachSnafu.build())?;

        let dt_s = (close_approach.tca - reference_epoch).to_seconds();

        let primary_covariance_at_tca = Covariance::initial(sigmas.sigma_pos_init_m, sigmas.sigma_vel_init_ms)
            .propagate(dt_s, sigmas.sigma_pos_proc_m, sigmas.sigma_vel_proc_ms);
        let secondary_covariance_at_tca = Covariance::initial(sigmas.sigma_pos_init_m, sigmas.sigma_vel_init_ms)
            .propagate(dt_s, sigmas.sigma_pos_proc_m, sigmas.sigma_vel_proc_ms);

        let combined = primary_covariance_at_tca.combine(&secondary_covariance_at_tca);
        combined.validate().context(NumericalSnafu)?;

        let position_block = combined.position_block();
        let pc = collision_probability(close_approach.miss_distance_m, &position_block, hbr_m);
        let estimate = CollisionEstimate {
            pc,
            combined_sigma_m: crate::covariance::isotropic_sigma(&position_block),
            hard_body_radius_m: hbr_m,
            risk_band: RiskBand::from_pc(pc),
        };

        let event_id = EventId::compute(primary_id, secondary_id, close_approach.tca, close_approach.miss_distance_m, pc);

        let event = Event {
            id: event_id,
            close_approach,
            estimate,
            primary_covariance_at_tca,
            secondary_covariance_at_tca,
            created_at: self.clock.now(),
        };

        let cdm_xml = crate::cdm::to_cdm_xml(&event, &format!("{}", event.created_at));
        self.sink.emit(&event, &cdm_xml);

        self.events
            .lock()
            .expect("event store mutex poisoned")
            .insert(event_id, event.clone());

        Ok(event)
    }

    /// `spec.md` §4.9 `screen`: batch screening over every primary against
    /// every secondary in the catalog.
    pub fn screen(
        &self,
        horizon_s: f64,
        screening_km: f64,
        risk_km: f64,
        token: &CancellationToken,
        deadline: Option<Instant>,
    ) -> ScreenResult {
        let mut config = self.config.screening;
        config.screening_km = screening_km;
        config.risk_km = risk_km;

        screener::screen(
            &self.catalog,
            self.clock.now(),
            horizon_s,
            &config,
            self.config.force_model,
            token,
            deadline,
        )
    }

    pub fn get_event(&self, event_id: EventId) -> Result<Event, CoreError> {
        self.events
            .lock()
            .expect("event store mutex poisoned")
            .get(&event_id)
            .cloned()
            .ok_or_else(|| NotFoundSnafu { event_id }.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, Tags};
    use crate::element_set::ElementSet;

    const LINE1: &str = "1 25544U 98067A   20001.50000000  .00001234  00000-0  12345-4 0  9999";
    const LINE2: &str = "2 25544  51.6333 123.4560 0007763  90.0000 270.0000 15.49289811  5678";

    fn head_on_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        let primary = ElementSet::parse(1, "PRIMARY", LINE1, LINE2).unwrap();
        let mut secondary = primary.clone();
        secondary.catalog_id = 2;

        catalog.insert(CatalogEntry::new(
            primary,
            Tags {
                primary: true,
                ..Default::default()
            },
        ));
        catalog.insert(CatalogEntry::new(secondary, Tags::default()));
        catalog
    }

    #[test]
    fn assess_rejects_config_with_oversized_window() {
        let core = Core::new(head_on_catalog(), CoreConfig::default());
        let sigmas = AssessSigmas::from_config(&CovarianceConfig::default());
        let result = core.assess(1, 2, 100.0 * 86_400.0, 1.0, sigmas, 10.0);
        assert!(matches!(result, Err(CoreError::Config { .. })));
    }

    #[test]
    fn assess_rejects_unknown_catalog_object_distinctly_from_no_close_approach() {
        let core = Core::new(head_on_catalog(), CoreConfig::default());
        let sigmas = AssessSigmas::from_config(&CovarianceConfig::default());
        let result = core.assess(1, 999, 3600.0, 1.0, sigmas, 10.0);
        assert!(matches!(
            result,
            Err(CoreError::ObjectNotInCatalog { catalog_id: 999 })
        ));
    }

    #[test]
    fn get_event_not_found_for_unknown_id() {
        let core = Core::new(head_on_catalog(), CoreConfig::default());
        let bogus = EventId::compute(9, 9, hifitime::Epoch::from_gregorian_utc_at_midnight(2020, 1, 1), 0.0, 0.0);
        let result = core.get_event(bogus);
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }
}
