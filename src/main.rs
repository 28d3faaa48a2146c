//! Headless growth runner.
//!
//! Usage: `cellgrid [CONFIG]`, where CONFIG is a `.toml` or `.json`
//! [`RunConfig`]. Without an argument `cellgrid.toml` is used when present.

use cellgrid::config::LogLevel;
use cellgrid::{GrowthSimulation, RunConfig, SnapshotError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let mut config = match RunConfig::load(path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(LogLevel::default());
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    config.apply_env_overrides();
    init_logging(config.logging.level);

    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: LogLevel) {
    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(config: &RunConfig) -> Result<(), SnapshotError> {
    info!(
        seed = config.seed,
        steps = config.steps,
        dt = config.dt,
        parallel = config.parallel,
        "starting growth run"
    );
    let mut sim = GrowthSimulation::seeded(config.params, config.seed)
        .with_parallel(config.parallel);

    let started = Instant::now();
    for _ in 0..config.steps {
        let stats = sim.step(config.dt);
        if config.log_interval > 0 && stats.step % u64::from(config.log_interval) == 0 {
            info!(
                step = stats.step,
                particles = stats.particles_after,
                links = stats.link_count,
                system_size = stats.system_size,
                "progress"
            );
        }
    }
    info!(
        particles = sim.particles().len(),
        links = sim.links().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "run complete"
    );

    if let Some(path) = &config.output {
        sim.snapshot().write_json(path)?;
        info!(path = %path.display(), "snapshot written");
    }
    Ok(())
}
