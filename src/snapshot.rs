//! Serializable view of a simulation state for visualizers.

use crate::error::SnapshotError;
use crate::links::LinkSet;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Positions and links at the end of a step.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub step: u64,
    pub system_size: f32,
    pub particles: Vec<[f32; 3]>,
    pub links: Vec<[u32; 2]>,
}

impl Snapshot {
    pub(crate) fn capture(
        step: u64,
        system_size: f32,
        particles: &[Vec3],
        links: &LinkSet,
    ) -> Self {
        Self {
            step,
            system_size,
            particles: particles.iter().map(|p| p.to_array()).collect(),
            links: links.iter().map(|l| l.as_array()).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), SnapshotError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
