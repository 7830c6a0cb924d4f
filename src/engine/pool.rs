use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::SessionError;

pub const MIN_WEIGHT: f64 = 1.0;
pub const MAX_WEIGHT: f64 = 20.0;
pub const DEFAULT_WEIGHT: f64 = 5.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PracticeCharacter {
    pub glyph: String,
    /// Lowercase romanizations. The first one is canonical and is what the
    /// player is shown after a miss.
    pub answers: Vec<String>,
    pub weight: f64,
}

impl PracticeCharacter {
    pub fn new(glyph: &str, answers: &[&str], weight: f64) -> Self {
        Self {
            glyph: glyph.to_string(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
            weight: clamp_weight(weight),
        }
    }

    pub fn canonical_answer(&self) -> &str {
        self.answers.first().map(String::as_str).unwrap_or("")
    }
}

pub fn clamp_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        return MIN_WEIGHT;
    }
    weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
}

#[derive(Clone, Debug)]
pub struct WeightedCharacterPool {
    chars: Vec<PracticeCharacter>,
}

impl WeightedCharacterPool {
    pub fn new(chars: Vec<PracticeCharacter>) -> Result<Self, SessionError> {
        if chars.is_empty() {
            return Err(SessionError::EmptyPool);
        }
        if let Some(bad) = chars.iter().find(|c| c.answers.is_empty()) {
            return Err(SessionError::NoAnswers(bad.glyph.clone()));
        }
        let chars = chars
            .into_iter()
            .map(|mut c| {
                c.weight = clamp_weight(c.weight);
                c
            })
            .collect();
        Ok(Self { chars })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn characters(&self) -> &[PracticeCharacter] {
        &self.chars
    }

    pub fn get(&self, glyph: &str) -> Option<&PracticeCharacter> {
        self.chars.iter().find(|c| c.glyph == glyph)
    }

    pub fn total_weight(&self) -> f64 {
        self.chars.iter().map(|c| c.weight).sum()
    }

    /// Weighted draw. `roll` must lie in `[0, 1)`; it is scaled by the
    /// total weight and walked down through the pool in order.
    pub fn pick(&self, roll: f64) -> &PracticeCharacter {
        &self.chars[self.pick_index(roll, None)]
    }

    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &PracticeCharacter {
        &self.chars[self.draw_index(rng)]
    }

    pub fn draw_index<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.pick_index(rng.r#gen::<f64>(), None)
    }

    /// Like `draw`, but never returns `glyph` unless it is the only entry.
    pub fn draw_excluding<R: Rng + ?Sized>(&self, glyph: &str, rng: &mut R) -> usize {
        let skip = self.chars.iter().position(|c| c.glyph == glyph);
        if self.chars.len() < 2 || skip.is_none() {
            return self.draw_index(rng);
        }
        self.pick_index(rng.r#gen::<f64>(), skip)
    }

    fn pick_index(&self, roll: f64, skip: Option<usize>) -> usize {
        let total: f64 = self
            .chars
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .map(|(_, c)| c.weight)
            .sum();
        let mut remaining = roll.clamp(0.0, 1.0) * total;
        let mut last = 0;
        for (i, c) in self.chars.iter().enumerate() {
            if Some(i) == skip {
                continue;
            }
            last = i;
            remaining -= c.weight;
            if remaining <= 0.0 {
                return i;
            }
        }
        // Float drift can leave a sliver of roll after the last entry.
        last
    }

    /// Shift one glyph's weight by `delta`, clamped to the weight bounds.
    /// Returns the new weight, or `None` if the glyph is not in the pool.
    pub fn adjust_weight(&mut self, glyph: &str, delta: f64) -> Option<f64> {
        let c = self.chars.iter_mut().find(|c| c.glyph == glyph)?;
        c.weight = clamp_weight(c.weight + delta);
        Some(c.weight)
    }

    pub fn adjusted(&self, glyph: &str, delta: f64) -> Self {
        let mut next = self.clone();
        next.adjust_weight(glyph, delta);
        next
    }

    pub fn weights(&self) -> BTreeMap<String, f64> {
        self.chars
            .iter()
            .map(|c| (c.glyph.clone(), c.weight))
            .collect()
    }

    /// Restore persisted weights. Glyphs not in the pool are ignored.
    pub fn apply_weights(&mut self, weights: &BTreeMap<String, f64>) {
        for c in &mut self.chars {
            if let Some(&w) = weights.get(&c.glyph) {
                c.weight = clamp_weight(w);
            }
        }
    }
}
