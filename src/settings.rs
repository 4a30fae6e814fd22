//! Engine settings
//!
//! Persisted as JSON next to the host. Timing values only affect pacing;
//! the logical outcome of a run never depends on them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::Variant;
use crate::progress::StoreError;

/// Inter-step delay per discrete variant, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepDelays {
    pub maze: f32,
    pub ruins: f32,
    pub miner: f32,
}

impl Default for StepDelays {
    fn default() -> Self {
        Self {
            maze: 0.6,
            ruins: 0.4,
            miner: 0.8,
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Timing ===
    pub step_delays: StepDelays,
    /// Extra pause after a SCAN step
    pub scan_delay: f32,
    /// How long the maze holds its summary before declaring WIN
    pub celebrate_dwell: f32,
    /// Continuous-mode frame interval
    pub frame_interval: f32,
    /// Most steps or frames delivered by one update
    pub max_steps_per_update: u32,

    // === Generation ===
    /// Fixed RNG seed; entropy when unset
    pub seed: Option<u64>,

    // === Cosmetic ===
    /// Passed through to the presentation layer untouched
    pub active_skin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            step_delays: StepDelays::default(),
            scan_delay: 0.6,
            celebrate_dwell: 2.5,
            frame_interval: 1.0 / 60.0,
            max_steps_per_update: 8,
            seed: None,
            active_skin: "bat".to_string(),
        }
    }
}

impl Settings {
    /// Scheduling interval for a variant
    pub fn interval_for(&self, variant: &Variant) -> f32 {
        match variant {
            Variant::Maze { .. } => self.step_delays.maze,
            Variant::Ruins => self.step_delays.ruins,
            Variant::Miner => self.step_delays.miner,
            Variant::Flight | Variant::Catch => self.frame_interval,
        }
    }

    /// Seed to use for this session
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from `path`
    pub fn try_load(path: &Path) -> Result<Self, StoreError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
