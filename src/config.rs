//! Run configuration.
//!
//! A [`RunConfig`] describes one headless growth run: physical parameters,
//! seed, time step, step count, and where to put the result. It loads from
//! TOML or JSON, and a few fields can be overridden from the environment.
//!
//! ```toml
//! seed = 7
//! dt = 0.01
//! steps = 200
//! parallel = true
//! output = "growth.json"
//!
//! [params]
//! rest_length = 1.0
//! spring_factor = 2.0
//!
//! [logging]
//! level = "debug"
//! ```

use crate::error::ConfigError;
use crate::simulation::SimulationParams;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Default config file looked up by the runner.
pub const DEFAULT_CONFIG_FILE: &str = "cellgrid.toml";

/// Settings for a headless simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Seed of the division random source.
    pub seed: u64,
    /// Time step passed to every step.
    pub dt: f32,
    /// Number of steps to run.
    pub steps: u32,
    /// Run the repulsion pass on the rayon pool.
    pub parallel: bool,
    /// Log a progress line every this many steps (0 disables).
    pub log_interval: u32,
    /// Where to write the final snapshot as JSON.
    pub output: Option<PathBuf>,
    pub params: SimulationParams,
    pub logging: LoggingConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            dt: 0.01,
            steps: 100,
            parallel: false,
            log_interval: 10,
            output: None,
            params: SimulationParams::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from a file, choosing the format by extension (`.json` or TOML).
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Load `path` if given, else [`DEFAULT_CONFIG_FILE`] if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Override fields from `CELLGRID_STEPS`, `CELLGRID_SEED` and `CELLGRID_DT`.
    ///
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(steps) = env_value("CELLGRID_STEPS") {
            self.steps = steps;
        }
        if let Some(seed) = env_value("CELLGRID_SEED") {
            self.seed = seed;
        }
        if let Some(dt) = env_value("CELLGRID_DT") {
            self.dt = dt;
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.params.validate()?;
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::Validation(format!("dt must be positive, got {}", self.dt)));
        }
        Ok(())
    }
}

fn env_value<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.parse().ok()
}

/// Logging configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is not set.
    pub level: LogLevel,
}

/// Log verbosity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_toml_serialization() {
        let config = RunConfig {
            seed: 99,
            output: Some(PathBuf::from("out.json")),
            ..RunConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = RunConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_json_serialization() {
        let config = RunConfig::default();
        let json_str = serde_json::to_string(&config).unwrap();
        let parsed = RunConfig::from_json_str(&json_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = RunConfig::from_toml_str(
            r#"
            steps = 5
            [params]
            spring_factor = 3.0
            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.steps, 5);
        assert_eq!(config.params.spring_factor, 3.0);
        assert_eq!(config.params.rest_length, SimulationParams::default().rest_length);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_validation_errors() {
        let config = RunConfig {
            dt: 0.0,
            ..RunConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = RunConfig::default();
        config.params.cell_mass = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(RunConfig::from_toml_str("steps = \"many\""), Err(ConfigError::Parse(_))));
    }
}
