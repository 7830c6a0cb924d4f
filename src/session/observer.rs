use crate::engine::pool::WeightedCharacterPool;

/// Outbound hooks for collaborators outside the engine (stats recording,
/// weight persistence). Implementations must not fail into the session:
/// anything that can go wrong on their side is theirs to log and drop.
pub trait SessionObserver {
    /// Called exactly once per resolved character.
    fn on_attempt(&mut self, glyph: &str, correct: bool);

    /// Called after every weight adjustment.
    fn on_weights_changed(&mut self, pool: &WeightedCharacterPool);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_attempt(&mut self, _glyph: &str, _correct: bool) {}

    fn on_weights_changed(&mut self, _pool: &WeightedCharacterPool) {}
}
