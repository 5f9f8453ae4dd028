//! `ssa`: the core's CLI surface (`spec.md` §6). Catalog loading and
//! presentation belong to the external layer; this binary wires the
//! minimum the core itself defines: `assess` and `screen`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ssa_core::prelude::*;

#[derive(Parser)]
#[command(name = "ssa", about = "Space situational awareness core CLI")]
struct Cli {
    /// Path to a YAML catalog file: a sequence of
    /// `{catalog_id, name, line1, line2, primary, debris, rocket_body}`.
    #[arg(long, global = true, default_value = "catalog.yaml")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assess one (primary, secondary) pair for a close approach and Pc.
    Assess {
        id1: u64,
        id2: u64,
        #[arg(long, default_value_t = 7.0 * 86_400.0)]
        window: f64,
        #[arg(long, default_value_t = 1.0)]
        step: f64,
    },
    /// Screen the whole catalog for close approaches.
    Screen {
        #[arg(long, default_value_t = 7.0 * 86_400.0)]
        horizon: f64,
    },
}

#[derive(serde::Deserialize)]
struct RawEntry {
    catalog_id: u64,
    name: String,
    line1: String,
    line2: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    debris: bool,
    #[serde(default)]
    rocket_body: bool,
}

fn load_catalog(path: &std::path::Path) -> Result<Catalog, String> {
    let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let raw_entries: Vec<RawEntry> = serde_yaml::from_reader(file).map_err(|e| e.to_string())?;

    let mut catalog = Catalog::new();
    for raw in raw_entries {
        match ElementSet::parse(raw.catalog_id, raw.name, &raw.line1, &raw.line2) {
            Ok(element_set) => catalog.insert(CatalogEntry::new(
                element_set,
                Tags {
                    primary: raw.primary,
                    debris: raw.debris,
                    rocket_body: raw.rocket_body,
                },
            )),
            Err(e) => log::warn!("skipping invalid element set {}: {e}", raw.catalog_id),
        }
    }
    Ok(catalog)
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let catalog = match load_catalog(&cli.catalog) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: could not load catalog: {e}");
            return ExitCode::from(1);
        }
    };

    let core = Core::new(catalog, CoreConfig::default());

    match cli.command {
        Command::Assess { id1, id2, window, step } => run_assess(&core, id1, id2, window, step),
        Command::Screen { horizon } => run_screen(&core, horizon),
    }
}

fn run_assess(core: &Core, id1: u64, id2: u64, window: f64, step: f64) -> ExitCode {
    let config = CoreConfig::default();
    let sigmas = AssessSigmas::from_config(&config.covariance);

    match core.assess(id1, id2, window, step, sigmas, config.pc.hard_body_radius_m) {
        Ok(event) => {
            println!(
                "event {} risk={} pc={:.3e} miss_km={:.3}",
                event.id,
                event.estimate.risk_band,
                event.estimate.pc,
                event.close_approach.miss_distance_m / 1000.0
            );
            ExitCode::from(0)
        }
        Err(CoreError::Propagation {
            source: ssa_core::errors::PropagatorError::InvalidElementSet { .. },
        }) => ExitCode::from(2),
        Err(CoreError::NoCloseApproach) => ExitCode::from(3),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_screen(core: &Core, horizon: f64) -> ExitCode {
    let config = CoreConfig::default();
    let token = ssa_core::screener::CancellationToken::new();
    let result = core.screen(horizon, config.screening.screening_km, config.screening.risk_km, &token, None);

    for close_approach in &result.close_approaches {
        println!(
            "{} {} tca={} miss_km={:.3} rel_speed_kms={:.3}",
            close_approach.primary_id,
            close_approach.secondary_id,
            close_approach.tca,
            close_approach.miss_distance_m / 1000.0,
            close_approach.relative_speed_m_s / 1000.0
        );
    }

    ExitCode::from(0)
}
