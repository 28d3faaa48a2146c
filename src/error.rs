//! Error types for cellgrid.
//!
//! Only recoverable failures live here: loading a run configuration and
//! writing snapshots. Broken grid or link invariants are programmer errors
//! and panic at the point of violation instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a [`RunConfig`](crate::RunConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file contents could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),
    /// Parsed, but the values are unusable.
    #[error("invalid config: {0}")]
    Validation(String),
}

/// Errors that can occur while exporting a [`Snapshot`](crate::Snapshot).
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Failed to write the snapshot file.
    #[error("failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to serialize the snapshot.
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
