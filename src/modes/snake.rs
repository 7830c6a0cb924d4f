use std::collections::VecDeque;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::debug;

use crate::engine::SessionError;
use crate::engine::combo::ComboState;
use crate::engine::matcher;
use crate::engine::pool::{PracticeCharacter, WeightedCharacterPool};
use crate::engine::timer::{CountdownTimer, Tick};
use crate::session::observer::SessionObserver;
use crate::session::quiz::SessionSettings;
use crate::session::result::{SessionResult, SessionTally};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// The two directions a snake heading this way may turn to.
    pub fn orthogonal(self) -> [Direction; 2] {
        match self {
            Direction::Up | Direction::Down => [Direction::Left, Direction::Right],
            Direction::Left | Direction::Right => [Direction::Up, Direction::Down],
        }
    }

    fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collision {
    Wall,
    SelfBite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Ate,
    Died(Collision),
}

pub type Cell = (i32, i32);

/// Plain snake rules on a bounded board. Knows nothing about kana.
pub struct SnakeGame {
    width: i32,
    height: i32,
    /// Head first.
    body: VecDeque<Cell>,
    heading: Direction,
    food: Option<Cell>,
    growth: u32,
    alive: bool,
    rng: SmallRng,
}

impl SnakeGame {
    pub const START_LENGTH: usize = 3;

    pub fn new(width: i32, height: i32, rng: SmallRng) -> Result<Self, SessionError> {
        if width < 5 || height < 5 {
            return Err(SessionError::InvalidMode(format!(
                "snake board must be at least 5x5 (got {width}x{height})"
            )));
        }
        let (cx, cy) = (width / 2, height / 2);
        let body = (0..Self::START_LENGTH as i32).map(|i| (cx - i, cy)).collect();
        let mut game = Self {
            width,
            height,
            body,
            heading: Direction::Right,
            food: None,
            growth: 0,
            alive: true,
            rng,
        };
        game.place_food();
        Ok(game)
    }

    /// Rejects turning onto the current heading or straight back into the
    /// neck.
    pub fn turn(&mut self, direction: Direction) -> bool {
        if !self.alive || direction == self.heading || direction == self.heading.opposite() {
            return false;
        }
        self.heading = direction;
        true
    }

    pub fn step(&mut self) -> StepOutcome {
        if !self.alive {
            return StepOutcome::Died(Collision::SelfBite);
        }
        let (hx, hy) = self.head();
        let (dx, dy) = self.heading.delta();
        let next = (hx + dx, hy + dy);

        if next.0 < 0 || next.1 < 0 || next.0 >= self.width || next.1 >= self.height {
            self.alive = false;
            return StepOutcome::Died(Collision::Wall);
        }

        let eats = self.food == Some(next);
        let tail_moves = self.growth == 0 && !eats;
        let checked = self.body.len() - usize::from(tail_moves);
        if self.body.iter().take(checked).any(|&c| c == next) {
            self.alive = false;
            return StepOutcome::Died(Collision::SelfBite);
        }

        self.body.push_front(next);
        if eats {
            self.growth += 1;
        }
        if self.growth > 0 {
            self.growth -= 1;
        } else {
            self.body.pop_back();
        }

        if eats {
            self.place_food();
            StepOutcome::Ate
        } else {
            StepOutcome::Moved
        }
    }

    fn place_food(&mut self) {
        let free: Vec<Cell> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|c| !self.body.contains(c))
            .collect();
        self.food = if free.is_empty() {
            None
        } else {
            Some(free[self.rng.gen_range(0..free.len())])
        };
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }
}

#[derive(Clone, Debug)]
pub struct SnakeSettings {
    pub width: i32,
    pub height: i32,
    pub step_interval_ms: u64,
    pub min_step_interval_ms: u64,
    /// Multiplied into the step interval each time food is eaten.
    pub speedup: f64,
    pub food_bonus: u32,
}

impl Default for SnakeSettings {
    fn default() -> Self {
        Self {
            width: 20,
            height: 12,
            step_interval_ms: 450,
            min_step_interval_ms: 150,
            speedup: 0.95,
            food_bonus: 25,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SnakeEvent {
    Turned {
        direction: Direction,
        glyph: String,
        points: u32,
    },
    Missed {
        glyphs: Vec<String>,
    },
    Ate,
    GameOver(Collision),
}

const PROMPT_DRAW_ATTEMPTS: usize = 64;

/// Direction-steering drill: each direction carries a kana, and typing the
/// reading of one offered on either side of the snake turns it that way.
pub struct SnakeMode {
    settings: SnakeSettings,
    weights: SessionSettings,
    game: SnakeGame,
    pool: WeightedCharacterPool,
    /// Pool index bound to each direction, in `Direction::index` order.
    prompt: [usize; 4],
    pending_input: String,
    combo: ComboState,
    step_timer: CountdownTimer,
    step_interval_ms: u64,
    observer: Box<dyn SessionObserver>,
    rng: SmallRng,
    tally: SessionTally,
}

impl SnakeMode {
    pub fn new(
        pool: WeightedCharacterPool,
        weights: SessionSettings,
        settings: SnakeSettings,
        observer: Box<dyn SessionObserver>,
        mut rng: SmallRng,
    ) -> Result<Self, SessionError> {
        weights.validate()?;
        if pool.len() < 4 {
            return Err(SessionError::InvalidMode(format!(
                "snake needs at least 4 characters (got {})",
                pool.len()
            )));
        }
        if settings.step_interval_ms == 0 || settings.min_step_interval_ms == 0 {
            return Err(SessionError::InvalidMode(
                "step interval must be positive".to_string(),
            ));
        }
        let game_rng = SmallRng::from_rng(&mut rng)
            .map_err(|e| SessionError::InvalidMode(format!("rng: {e}")))?;
        let game = SnakeGame::new(settings.width, settings.height, game_rng)?;
        let mut step_timer = CountdownTimer::new();
        step_timer.start(settings.step_interval_ms);
        let mut mode = Self {
            step_interval_ms: settings.step_interval_ms,
            settings,
            weights,
            game,
            pool,
            prompt: [0, 1, 2, 3],
            pending_input: String::new(),
            combo: ComboState::default(),
            step_timer,
            observer,
            rng,
            tally: SessionTally::default(),
        };
        mode.new_prompt();
        Ok(mode)
    }

    /// Bind four distinct characters to the four directions, avoiding
    /// characters that share a reading so one answer can never match both
    /// offered sides.
    fn new_prompt(&mut self) {
        let mut chosen: Vec<usize> = Vec::with_capacity(4);
        for _ in 0..PROMPT_DRAW_ATTEMPTS {
            if chosen.len() == 4 {
                break;
            }
            let idx = self.pool.draw_index(&mut self.rng);
            if !chosen.contains(&idx) && !self.shares_answer(idx, &chosen) {
                chosen.push(idx);
            }
        }
        for idx in 0..self.pool.len() {
            if chosen.len() == 4 {
                break;
            }
            if !chosen.contains(&idx) {
                chosen.push(idx);
            }
        }
        self.prompt.copy_from_slice(&chosen[..4]);
        self.pending_input.clear();
    }

    fn shares_answer(&self, idx: usize, chosen: &[usize]) -> bool {
        let chars = self.pool.characters();
        chars[idx]
            .answers
            .iter()
            .any(|a| chosen.iter().any(|&c| chars[c].answers.contains(a)))
    }

    pub fn binding(&self, direction: Direction) -> &PracticeCharacter {
        &self.pool.characters()[self.prompt[direction.index()]]
    }

    /// The two characters currently offered, left/right of the heading.
    pub fn offered(&self) -> [(Direction, &PracticeCharacter); 2] {
        let [a, b] = self.game.heading().orthogonal();
        [(a, self.binding(a)), (b, self.binding(b))]
    }

    pub fn input_changed(&mut self, text: &str) -> Vec<SnakeEvent> {
        let mut events = Vec::new();
        if !self.game.is_alive() {
            return events;
        }

        let offered: Vec<(Direction, String, Vec<String>)> = self
            .offered()
            .iter()
            .map(|(d, c)| (*d, c.glyph.clone(), c.answers.clone()))
            .collect();

        if let Some((direction, glyph, _)) = offered
            .iter()
            .find(|(_, _, answers)| matcher::is_exact_match(text, answers))
        {
            self.observer.on_attempt(glyph, true);
            let gain = self.combo.record_correct(&self.weights.combo_table);
            self.adjust_weight(glyph, -self.weights.weight_decrease);
            self.tally.correct += 1;
            self.game.turn(*direction);
            debug!(target: "snake", glyph = %glyph, ?direction, "turn");
            events.push(SnakeEvent::Turned {
                direction: *direction,
                glyph: glyph.clone(),
                points: gain.points,
            });
            self.new_prompt();
        } else if matcher::normalize(text).is_empty() {
            self.pending_input.clear();
        } else if offered
            .iter()
            .any(|(_, _, answers)| matcher::is_valid_prefix(text, answers))
        {
            self.pending_input = text.to_string();
        } else {
            for (_, glyph, _) in &offered {
                self.observer.on_attempt(glyph, false);
                self.adjust_weight(glyph, self.weights.weight_increase);
            }
            self.combo.record_miss();
            self.tally.incorrect += 1;
            events.push(SnakeEvent::Missed {
                glyphs: offered.into_iter().map(|(_, g, _)| g).collect(),
            });
            self.new_prompt();
        }
        events
    }

    pub fn tick(&mut self, delta_ms: u64) -> Vec<SnakeEvent> {
        let mut events = Vec::new();
        if !self.game.is_alive() {
            return events;
        }
        self.tally.elapsed_ms += delta_ms;
        if self.step_timer.tick(delta_ms) != Tick::Expired {
            return events;
        }
        match self.game.step() {
            StepOutcome::Moved => {}
            StepOutcome::Ate => {
                self.combo.add_bonus(self.settings.food_bonus);
                let faster = (self.step_interval_ms as f64 * self.settings.speedup) as u64;
                self.step_interval_ms = faster.max(self.settings.min_step_interval_ms);
                events.push(SnakeEvent::Ate);
            }
            StepOutcome::Died(collision) => {
                self.step_timer.stop();
                debug!(target: "snake", ?collision, length = self.game.body().len(), "game over");
                events.push(SnakeEvent::GameOver(collision));
                return events;
            }
        }
        self.step_timer.reset(self.step_interval_ms);
        events
    }

    fn adjust_weight(&mut self, glyph: &str, delta: f64) {
        if self.pool.adjust_weight(glyph, delta).is_some() {
            self.observer.on_weights_changed(&self.pool);
        }
    }

    pub fn game(&self) -> &SnakeGame {
        &self.game
    }

    pub fn combo(&self) -> &ComboState {
        &self.combo
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn pool(&self) -> &WeightedCharacterPool {
        &self.pool
    }

    pub fn step_timer(&self) -> &CountdownTimer {
        &self.step_timer
    }

    pub fn is_over(&self) -> bool {
        !self.game.is_alive()
    }

    pub fn result(&self) -> SessionResult {
        SessionResult::new(
            "snake",
            self.combo.score,
            self.combo.highest_streak,
            &self.tally,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::observer::testing::RecordingObserver;

    fn game() -> SnakeGame {
        SnakeGame::new(8, 8, SmallRng::seed_from_u64(5)).unwrap()
    }

    fn kana_pool() -> WeightedCharacterPool {
        let chars = [
            ("あ", "a"),
            ("い", "i"),
            ("う", "u"),
            ("え", "e"),
            ("お", "o"),
            ("か", "ka"),
        ]
        .iter()
        .map(|&(g, a)| PracticeCharacter::new(g, &[a], 5.0))
        .collect();
        WeightedCharacterPool::new(chars).unwrap()
    }

    fn mode() -> (SnakeMode, RecordingObserver) {
        let observer = RecordingObserver::default();
        let settings = SnakeSettings {
            width: 10,
            height: 10,
            step_interval_ms: 100,
            ..SnakeSettings::default()
        };
        let mode = SnakeMode::new(
            kana_pool(),
            SessionSettings::default(),
            settings,
            Box::new(observer.clone()),
            SmallRng::seed_from_u64(8),
        )
        .unwrap();
        (mode, observer)
    }

    #[test]
    fn test_orthogonal_never_offers_reverse_or_same() {
        for d in Direction::all() {
            let turns = d.orthogonal();
            assert!(!turns.contains(&d));
            assert!(!turns.contains(&d.opposite()));
        }
    }

    #[test]
    fn test_turn_rejects_reverse_and_same() {
        let mut g = game();
        assert_eq!(g.heading(), Direction::Right);
        assert!(!g.turn(Direction::Left));
        assert!(!g.turn(Direction::Right));
        assert!(g.turn(Direction::Up));
        assert_eq!(g.heading(), Direction::Up);
    }

    #[test]
    fn test_wall_collision_kills() {
        let mut g = game();
        let mut outcome = StepOutcome::Moved;
        for _ in 0..10 {
            outcome = g.step();
            if outcome != StepOutcome::Moved && outcome != StepOutcome::Ate {
                break;
            }
        }
        assert_eq!(outcome, StepOutcome::Died(Collision::Wall));
        assert!(!g.is_alive());
    }

    #[test]
    fn test_eating_grows_body() {
        let mut g = game();
        let (hx, hy) = g.head();
        g.food = Some((hx + 1, hy));
        assert_eq!(g.step(), StepOutcome::Ate);
        assert_eq!(g.body().len(), SnakeGame::START_LENGTH + 1);
        assert_ne!(g.food(), Some(g.head()));
        assert!(!g.body().contains(&g.food().unwrap()));
        g.food = None;
        assert_eq!(g.step(), StepOutcome::Moved);
        assert_eq!(g.body().len(), SnakeGame::START_LENGTH + 1);
    }

    #[test]
    fn test_self_collision_kills() {
        let mut g = game();
        g.food = None;
        g.body = VecDeque::from(vec![(4, 4), (3, 4), (3, 5), (4, 5), (5, 5)]);
        g.heading = Direction::Down;
        assert_eq!(g.step(), StepOutcome::Died(Collision::SelfBite));
    }

    #[test]
    fn test_moving_into_vacating_tail_is_allowed() {
        let mut g = game();
        g.food = None;
        g.body = VecDeque::from(vec![(4, 4), (3, 4), (3, 5), (4, 5)]);
        g.heading = Direction::Down;
        assert_eq!(g.step(), StepOutcome::Moved);
        assert_eq!(g.head(), (4, 5));
    }

    #[test]
    fn test_board_too_small_rejected() {
        assert!(SnakeGame::new(4, 10, SmallRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn test_prompt_binds_four_distinct_characters() {
        let (m, _) = mode();
        let mut glyphs: Vec<&str> = Direction::all()
            .iter()
            .map(|&d| m.binding(d).glyph.as_str())
            .collect();
        glyphs.sort();
        glyphs.dedup();
        assert_eq!(glyphs.len(), 4);
        let offered = m.offered();
        assert_eq!(offered[0].0, Direction::Up);
        assert_eq!(offered[1].0, Direction::Down);
    }

    #[test]
    fn test_typing_offered_answer_turns_snake() {
        let (mut m, obs) = mode();
        let (direction, target) = {
            let [(d, c), _] = m.offered();
            (d, c.clone())
        };
        let events = m.input_changed(&target.answers[0]);
        assert!(matches!(
            &events[0],
            SnakeEvent::Turned { direction: d, points: 10, .. } if *d == direction
        ));
        assert_eq!(m.game().heading(), direction);
        assert_eq!(obs.log.borrow().attempts, vec![(target.glyph.clone(), true)]);
        assert_eq!(m.pool().get(&target.glyph).unwrap().weight, 4.0);
    }

    #[test]
    fn test_hidden_direction_answer_is_a_miss() {
        let (mut m, obs) = mode();
        // Bound to the reverse direction: never offered.
        let hidden = m.binding(Direction::Left).answers[0].clone();
        let offered: Vec<String> = m.offered().iter().map(|(_, c)| c.glyph.clone()).collect();
        let events = m.input_changed(&hidden);
        assert_eq!(events, vec![SnakeEvent::Missed { glyphs: offered.clone() }]);
        assert_eq!(m.game().heading(), Direction::Right);
        let log = obs.log.borrow();
        assert_eq!(log.attempts.len(), 2);
        assert!(log.attempts.iter().all(|(_, ok)| !ok));
        assert_eq!(m.combo().streak, 0);
    }

    #[test]
    fn test_step_clock_moves_snake() {
        let (mut m, _) = mode();
        let start = m.game().head();
        assert!(m.tick(50).is_empty());
        assert_eq!(m.game().head(), start);
        m.tick(50);
        assert_eq!(m.game().head(), (start.0 + 1, start.1));
        assert!(m.step_timer().is_running());
    }

    #[test]
    fn test_game_over_stops_everything() {
        let (mut m, _) = mode();
        let mut over = None;
        for _ in 0..50 {
            for e in m.tick(100) {
                if let SnakeEvent::GameOver(c) = e {
                    over = Some(c);
                }
            }
        }
        assert_eq!(over, Some(Collision::Wall));
        assert!(m.is_over());
        assert!(m.input_changed("a").is_empty());
        assert!(m.tick(100).is_empty());
    }

    #[test]
    fn test_needs_four_characters() {
        let pool = WeightedCharacterPool::new(vec![
            PracticeCharacter::new("あ", &["a"], 5.0),
            PracticeCharacter::new("い", &["i"], 5.0),
        ])
        .unwrap();
        let result = SnakeMode::new(
            pool,
            SessionSettings::default(),
            SnakeSettings::default(),
            Box::new(crate::session::observer::NoopObserver),
            SmallRng::seed_from_u64(0),
        );
        assert!(result.is_err());
    }
}
