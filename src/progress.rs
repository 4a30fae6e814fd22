//! Progression callbacks and the reference progress record
//!
//! The engine only ever pushes into a `Progression`; it never reads back.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Score awarded per collected unit
pub const SCORE_PER_UNIT: u64 = 10;

/// Receiver for run outcomes
pub trait Progression {
    /// Called once when a run reaches WIN
    fn on_win(&mut self);
    /// Called at most once per winning run with the earned units
    fn on_collect(&mut self, amount: u32);
}

/// Failure reading or writing a persisted record
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Accumulated coins, score and wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    pub coins: u64,
    pub score: u64,
    pub wins: u32,
}

impl ProgressRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a record, starting fresh when missing or unreadable
    pub fn load(path: &Path) -> Self {
        let loaded = fs::read_to_string(path)
            .map_err(StoreError::from)
            .and_then(|json| Ok(serde_json::from_str::<ProgressRecord>(&json)?));
        match loaded {
            Ok(record) => {
                log::info!("Loaded progress ({} coins, {} wins)", record.coins, record.wins);
                record
            }
            Err(e) => {
                log::info!("No progress found, starting fresh ({})", e);
                Self::new()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        log::info!("Progress saved ({} coins)", self.coins);
        Ok(())
    }
}

impl Progression for ProgressRecord {
    fn on_win(&mut self) {
        self.wins += 1;
    }

    fn on_collect(&mut self, amount: u32) {
        if amount == 0 {
            return;
        }
        self.coins += u64::from(amount);
        self.score += u64::from(amount) * SCORE_PER_UNIT;
    }
}

impl<P: Progression + ?Sized> Progression for &mut P {
    fn on_win(&mut self) {
        (**self).on_win();
    }

    fn on_collect(&mut self, amount: u32) {
        (**self).on_collect(amount);
    }
}
