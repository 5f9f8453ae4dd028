//! Configuration loading and the tunables enumerated in `spec.md` §6.
//!
//! [`ConfigRepr`] mirrors the teacher's `crate::io::ConfigRepr` trait
//! (see `src/od/ground_station/mod.rs::impl ConfigRepr for GroundStation`):
//! any `Serialize + DeserializeOwned` type gets `load`/`load_named`/
//! `load_many` over YAML for free.

use std::fs::File;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use typed_builder::TypedBuilder;

use crate::errors::{
    ConfigError, NegativeSigmaSnafu, NonPositiveStepSnafu, WindowTooLargeSnafu,
};

/// Load/save a configuration type from/to a single YAML document, or a
/// YAML sequence of documents of the same type.
pub trait ConfigRepr: Sized + Serialize + DeserializeOwned {
    fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let file = File::open(&path).map_err(|e| ConfigError::Load {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;
        serde_yaml::from_reader(file).map_err(|e| ConfigError::Load {
            path: path_str,
            reason: e.to_string(),
        })
    }

    /// Loads one document out of a YAML mapping of `name -> document`,
    /// returning the entry keyed by `name`.
    fn load_named<P: AsRef<Path>>(path: P, name: &str) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let file = File::open(&path).map_err(|e| ConfigError::Load {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;
        let named: std::collections::BTreeMap<String, Self> =
            serde_yaml::from_reader(file).map_err(|e| ConfigError::Load {
                path: path_str.clone(),
                reason: e.to_string(),
            })?;
        named.into_iter().find(|(k, _)| k == name).map(|(_, v)| v).ok_or_else(|| ConfigError::Load {
            path: path_str,
            reason: format!("no document named '{name}'"),
        })
    }

    fn load_many<P: AsRef<Path>>(path: P) -> Result<Vec<Self>, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let file = File::open(&path).map_err(|e| ConfigError::Load {
            path: path_str.clone(),
            reason: e.to_string(),
        })?;
        serde_yaml::from_reader(file).map_err(|e| ConfigError::Load {
            path: path_str,
            reason: e.to_string(),
        })
    }
}

/// Force-model toggles and SRP parameters (`spec.md` §4.2, §6).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, TypedBuilder)]
#[serde(default)]
pub struct ForceModelConfig {
    #[builder(default = true)]
    pub enable_perturbations: bool,
    #[builder(default = true)]
    pub use_srp: bool,
    #[builder(default = 1.5)]
    pub cr: f64,
    #[builder(default = 0.02)]
    pub area_over_mass: f64,
}

impl Default for ForceModelConfig {
    fn default() -> Self {
        Self {
            enable_perturbations: true,
            use_srp: true,
            cr: 1.5,
            area_over_mass: 0.02,
        }
    }
}

impl ConfigRepr for ForceModelConfig {}

/// Screening thresholds (`spec.md` §4.5, §6).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, TypedBuilder)]
#[serde(default)]
pub struct ScreeningConfig {
    #[builder(default = 50.0)]
    pub screening_km: f64,
    #[builder(default = 1.0)]
    pub risk_km: f64,
    #[builder(default = 500)]
    pub coarse_steps: usize,
    #[builder(default = 7.0 * 86_400.0)]
    pub max_window_s: f64,
    #[builder(default = 1.0)]
    pub min_step_s: f64,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            screening_km: 50.0,
            risk_km: 1.0,
            coarse_steps: 500,
            max_window_s: 7.0 * 86_400.0,
            min_step_s: 1.0,
        }
    }
}

impl ConfigRepr for ScreeningConfig {}

impl ScreeningConfig {
    /// Fails fast per `spec.md` §7 `ConfigError`, before any propagation.
    pub fn validate(&self, window_s: f64, step_s: f64) -> Result<(), ConfigError> {
        if window_s > self.max_window_s {
            return WindowTooLargeSnafu {
                window_s,
                max_window_s: self.max_window_s,
            }
            .fail();
        }
        if step_s <= 0.0 {
            return NonPositiveStepSnafu { step_s }.fail();
        }
        Ok(())
    }
}

/// Covariance initialization and process-noise sigmas (`spec.md` §4.6, §6).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, TypedBuilder)]
#[serde(default)]
pub struct CovarianceConfig {
    #[builder(default = 0.1)]
    pub sigma_pos_init_km: f64,
    #[builder(default = 0.001)]
    pub sigma_vel_init_kms: f64,
    #[builder(default = 0.05)]
    pub sigma_pos_proc_km: f64,
    #[builder(default = 0.0001)]
    pub sigma_vel_proc_kms: f64,
}

impl Default for CovarianceConfig {
    fn default() -> Self {
        Self {
            sigma_pos_init_km: 0.1,
            sigma_vel_init_kms: 0.001,
            sigma_pos_proc_km: 0.05,
            sigma_vel_proc_kms: 0.0001,
        }
    }
}

impl ConfigRepr for CovarianceConfig {}

impl CovarianceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("sigma_pos_init_km", self.sigma_pos_init_km),
            ("sigma_vel_init_kms", self.sigma_vel_init_kms),
            ("sigma_pos_proc_km", self.sigma_pos_proc_km),
            ("sigma_vel_proc_kms", self.sigma_vel_proc_kms),
        ] {
            if value < 0.0 {
                return NegativeSigmaSnafu { name, value }.fail();
            }
        }
        Ok(())
    }
}

/// Pc estimator parameters (`spec.md` §4.7, §6).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, TypedBuilder)]
#[serde(default)]
pub struct PcConfig {
    #[builder(default = 10.0)]
    pub hard_body_radius_m: f64,
}

impl Default for PcConfig {
    fn default() -> Self {
        Self {
            hard_body_radius_m: 10.0,
        }
    }
}

impl ConfigRepr for PcConfig {}

/// Aggregate of every tunable in `spec.md` §6, loadable as a single YAML
/// document (`ConfigRepr`).
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub force_model: ForceModelConfig,
    pub screening: ScreeningConfig,
    pub covariance: CovarianceConfig,
    pub pc: PcConfig,
}

impl ConfigRepr for CoreConfig {}
