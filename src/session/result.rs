use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Running counters for one session. Elapsed time is the sum of ticks the
/// session actually consumed, so paused stretches do not count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionTally {
    pub correct: u32,
    pub incorrect: u32,
    pub timeouts: u32,
    pub elapsed_ms: u64,
}

impl SessionTally {
    pub fn attempts(&self) -> u32 {
        self.correct + self.incorrect + self.timeouts
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.attempts();
        if total == 0 {
            return 100.0;
        }
        (self.correct as f64 / total as f64) * 100.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionResult {
    #[serde(default = "default_mode")]
    pub mode: String,
    pub score: u64,
    pub highest_streak: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub timeouts: u32,
    pub accuracy: f64,
    pub elapsed_secs: f64,
    pub timestamp: DateTime<Utc>,
}

fn default_mode() -> String {
    "classic".to_string()
}

impl SessionResult {
    pub fn new(mode: &str, score: u64, highest_streak: u32, tally: &SessionTally) -> Self {
        Self {
            mode: mode.to_string(),
            score,
            highest_streak,
            correct: tally.correct,
            incorrect: tally.incorrect,
            timeouts: tally.timeouts,
            accuracy: tally.accuracy(),
            elapsed_secs: tally.elapsed_ms as f64 / 1000.0,
            timestamp: Utc::now(),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.correct + self.incorrect + self.timeouts
    }

    /// Correct answers per minute of active play.
    pub fn per_minute(&self) -> f64 {
        if self.elapsed_secs < 0.1 {
            return 0.0;
        }
        self.correct as f64 / (self.elapsed_secs / 60.0)
    }
}
