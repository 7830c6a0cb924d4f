use chrono::Utc;
use tracing::warn;

use crate::engine::pool::WeightedCharacterPool;
use crate::session::observer::SessionObserver;
use crate::store::json_store::JsonStore;
use crate::store::schema::{CharacterStatsData, WeightsData};

/// Write-through persistence of attempts and weights. Save failures are
/// logged and dropped so play is never interrupted by the disk.
pub struct StoreObserver {
    store: JsonStore,
    stats: CharacterStatsData,
    weights: WeightsData,
}

impl StoreObserver {
    pub fn new(store: JsonStore) -> Self {
        let stats = store.load_character_stats();
        let weights = store.load_weights();
        Self {
            store,
            stats,
            weights,
        }
    }

    pub fn stats(&self) -> &CharacterStatsData {
        &self.stats
    }

    pub fn weights(&self) -> &WeightsData {
        &self.weights
    }
}

impl SessionObserver for StoreObserver {
    fn on_attempt(&mut self, glyph: &str, correct: bool) {
        self.stats
            .stats
            .entry(glyph.to_string())
            .or_default()
            .record(correct, Utc::now());
        if let Err(e) = self.store.save_character_stats(&self.stats) {
            warn!(target: "store", glyph, error = %e, "failed to save character stats");
        }
    }

    fn on_weights_changed(&mut self, pool: &WeightedCharacterPool) {
        // Merge so glyphs outside the current practice set keep their weight.
        self.weights.weights.extend(pool.weights());
        if let Err(e) = self.store.save_weights(&self.weights) {
            warn!(target: "store", error = %e, "failed to save weights");
        }
    }
}
