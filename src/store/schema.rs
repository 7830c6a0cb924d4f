use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::result::SessionResult;

pub const SCHEMA_VERSION: u32 = 1;

/// Files written by an older or newer build are discarded rather than
/// migrated.
pub trait Versioned {
    fn schema_version(&self) -> u32;

    fn needs_reset(&self) -> bool {
        self.schema_version() != SCHEMA_VERSION
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeightsData {
    pub schema_version: u32,
    pub weights: BTreeMap<String, f64>,
}

impl Default for WeightsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            weights: BTreeMap::new(),
        }
    }
}

impl Versioned for WeightsData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterStatsEntry {
    pub attempts: u32,
    pub correct: u32,
    pub last_attempt: Option<DateTime<Utc>>,
}

impl CharacterStatsEntry {
    pub fn record(&mut self, correct: bool, at: DateTime<Utc>) {
        self.attempts += 1;
        if correct {
            self.correct += 1;
        }
        self.last_attempt = Some(at);
    }

    pub fn accuracy(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.correct as f64 / self.attempts as f64 * 100.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CharacterStatsData {
    pub schema_version: u32,
    pub stats: BTreeMap<String, CharacterStatsEntry>,
}

impl Default for CharacterStatsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            stats: BTreeMap::new(),
        }
    }
}

impl Versioned for CharacterStatsData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryData {
    pub schema_version: u32,
    pub sessions: Vec<SessionResult>,
}

impl Default for HistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            sessions: Vec::new(),
        }
    }
}

impl Versioned for HistoryData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl HistoryData {
    pub fn best_score(&self, mode: &str) -> Option<u64> {
        self.sessions
            .iter()
            .filter(|s| s.mode == mode)
            .map(|s| s.score)
            .max()
    }
}
