use serde::{Deserialize, Serialize};

use crate::engine::SessionError;

pub const BASE_POINTS: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComboTier {
    pub min_streak: u32,
    pub multiplier: f64,
}

/// Step function from streak length to score multiplier. Streaks below the
/// first tier score at 1.0.
#[derive(Clone, Debug, PartialEq)]
pub struct ComboTable {
    tiers: Vec<ComboTier>,
}

impl ComboTable {
    pub fn new(tiers: Vec<ComboTier>) -> Result<Self, SessionError> {
        let mut prev_streak = 0;
        let mut prev_mult = 1.0;
        for (i, tier) in tiers.iter().enumerate() {
            if tier.min_streak == 0 || (i > 0 && tier.min_streak <= prev_streak) {
                return Err(SessionError::InvalidComboTable(format!(
                    "thresholds must be positive and strictly increasing (got {} after {})",
                    tier.min_streak, prev_streak
                )));
            }
            if !(tier.multiplier >= prev_mult) {
                return Err(SessionError::InvalidComboTable(format!(
                    "multiplier {} at streak {} is below the previous tier",
                    tier.multiplier, tier.min_streak
                )));
            }
            prev_streak = tier.min_streak;
            prev_mult = tier.multiplier;
        }
        Ok(Self { tiers })
    }

    /// 10 → 1.5, 50 → 2.0, 100 → 3.0.
    pub fn standard() -> Self {
        Self {
            tiers: standard_tiers(),
        }
    }

    /// Shorter ramp: 5 → 1.5, 25 → 2.0, 50 → 3.0.
    pub fn quick() -> Self {
        Self {
            tiers: vec![
                ComboTier { min_streak: 5, multiplier: 1.5 },
                ComboTier { min_streak: 25, multiplier: 2.0 },
                ComboTier { min_streak: 50, multiplier: 3.0 },
            ],
        }
    }

    pub fn tiers(&self) -> &[ComboTier] {
        &self.tiers
    }

    /// 0 for the base tier, `n` once the n-th threshold is reached.
    pub fn tier_for_streak(&self, streak: u32) -> usize {
        self.tiers
            .iter()
            .take_while(|t| streak >= t.min_streak)
            .count()
    }

    pub fn multiplier_for_streak(&self, streak: u32) -> f64 {
        match self.tier_for_streak(streak) {
            0 => 1.0,
            n => self.tiers[n - 1].multiplier,
        }
    }
}

impl Default for ComboTable {
    fn default() -> Self {
        Self::standard()
    }
}

pub fn standard_tiers() -> Vec<ComboTier> {
    vec![
        ComboTier { min_streak: 10, multiplier: 1.5 },
        ComboTier { min_streak: 50, multiplier: 2.0 },
        ComboTier { min_streak: 100, multiplier: 3.0 },
    ]
}

pub fn score_delta(multiplier: f64) -> u32 {
    (BASE_POINTS * multiplier).floor() as u32
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComboGain {
    pub points: u32,
    pub multiplier: f64,
    /// The streak just crossed into a strictly higher tier.
    pub tier_up: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComboState {
    pub score: u64,
    pub streak: u32,
    pub highest_streak: u32,
    pub multiplier: f64,
}

impl Default for ComboState {
    fn default() -> Self {
        Self {
            score: 0,
            streak: 0,
            highest_streak: 0,
            multiplier: 1.0,
        }
    }
}

impl ComboState {
    pub fn record_correct(&mut self, table: &ComboTable) -> ComboGain {
        let before = table.tier_for_streak(self.streak);
        self.streak += 1;
        if self.streak > self.highest_streak {
            self.highest_streak = self.streak;
        }
        self.multiplier = table.multiplier_for_streak(self.streak);
        let points = score_delta(self.multiplier);
        self.score += u64::from(points);
        ComboGain {
            points,
            multiplier: self.multiplier,
            tier_up: table.tier_for_streak(self.streak) > before,
        }
    }

    pub fn record_miss(&mut self) {
        self.streak = 0;
        self.multiplier = 1.0;
    }

    /// Bonus points outside the streak rules (snake food).
    pub fn add_bonus(&mut self, points: u32) {
        self.score += u64::from(points);
    }
}
