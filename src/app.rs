use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{info, warn};

use kanadrill::config::Config;
use kanadrill::engine::catalog::Catalog;
use kanadrill::engine::pool::WeightedCharacterPool;
use kanadrill::modes::Mode;
use kanadrill::modes::falling::FallingGrid;
use kanadrill::modes::snake::{SnakeEvent, SnakeMode};
use kanadrill::modes::spiral::Spiral;
use kanadrill::session::observer::{NoopObserver, SessionObserver};
use kanadrill::session::quiz::{QuizSession, SessionEvent};
use kanadrill::session::result::SessionResult;
use kanadrill::store::json_store::JsonStore;
use kanadrill::store::recorder::StoreObserver;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Playing,
    Summary,
}

/// One running game. The quiz-backed modes own their session next to the
/// adapter that presents it.
pub enum Game {
    Classic(QuizSession),
    Falling {
        session: QuizSession,
        grid: FallingGrid,
    },
    Spiral {
        session: QuizSession,
        spiral: Spiral,
    },
    Snake(SnakeMode),
}

impl Game {
    pub fn is_over(&self) -> bool {
        match self {
            Game::Classic(_) | Game::Spiral { .. } => false,
            Game::Falling { grid, .. } => grid.is_over(),
            Game::Snake(snake) => snake.is_over(),
        }
    }

    pub fn result(&self, mode: Mode) -> SessionResult {
        match self {
            Game::Classic(session)
            | Game::Falling { session, .. }
            | Game::Spiral { session, .. } => session.result(mode.as_str()),
            Game::Snake(snake) => snake.result(),
        }
    }

    /// True when the answer field should be cleared.
    fn input_changed(&mut self, text: &str) -> bool {
        match self {
            Game::Classic(session) => resolved(&session.input_changed(text)),
            Game::Falling { session, grid } => resolved(&grid.input_changed(session, text)),
            Game::Spiral { session, spiral } => resolved(&spiral.input_changed(session, text)),
            Game::Snake(snake) => snake.input_changed(text).iter().any(|e| {
                matches!(e, SnakeEvent::Turned { .. } | SnakeEvent::Missed { .. })
            }),
        }
    }

    fn tick(&mut self, delta_ms: u64) -> bool {
        match self {
            Game::Classic(session) => resolved(&session.tick(delta_ms)),
            Game::Falling { session, grid } => resolved(&grid.tick(session, delta_ms)),
            Game::Spiral { session, spiral } => resolved(&spiral.tick(session, delta_ms)),
            Game::Snake(snake) => {
                snake.tick(delta_ms);
                false
            }
        }
    }
}

fn resolved(events: &[SessionEvent]) -> bool {
    events
        .iter()
        .any(|e| !matches!(e, SessionEvent::Paused | SessionEvent::Resumed))
}

pub struct App {
    pub screen: AppScreen,
    pub mode: Mode,
    pub config: Config,
    pub game: Game,
    /// Mirror of the answer field; the whole text is fed on every change.
    pub input: String,
    pub last_result: Option<SessionResult>,
    pub best_score: Option<u64>,
    pub should_quit: bool,
    pool: WeightedCharacterPool,
    store: Option<JsonStore>,
    rng: SmallRng,
}

impl App {
    pub fn new(config: Config, mode: Mode, seed: Option<u64>) -> Result<Self> {
        let catalog = Catalog::load().context("loading kana catalog")?;
        let chars = catalog.practice_set(&config.selection(), config.initial_weight)?;
        let mut pool = WeightedCharacterPool::new(chars)?;

        let store = match JsonStore::new() {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(error = %e, "data directory unavailable, progress will not be saved");
                None
            }
        };
        let best_score = store.as_ref().and_then(|s| {
            pool.apply_weights(&s.load_weights().weights);
            s.load_history().best_score(mode.as_str())
        });

        let mut rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let game = build_game(&config, mode, pool.clone(), observer(&store), &mut rng)?;
        info!(mode = mode.as_str(), characters = pool.len(), "game started");

        Ok(Self {
            screen: AppScreen::Playing,
            mode,
            config,
            game,
            input: String::new(),
            last_result: None,
            best_score,
            should_quit: false,
            pool,
            store,
            rng,
        })
    }

    pub fn type_char(&mut self, ch: char) {
        if self.screen != AppScreen::Playing {
            return;
        }
        self.input.push(ch);
        self.feed_input();
    }

    pub fn backspace(&mut self) {
        if self.screen != AppScreen::Playing {
            return;
        }
        self.input.pop();
        self.feed_input();
    }

    fn feed_input(&mut self) {
        if self.game.input_changed(&self.input) {
            self.input.clear();
        }
        self.check_game_over();
    }

    pub fn tick(&mut self, delta_ms: u64) {
        if self.screen != AppScreen::Playing {
            return;
        }
        if self.game.tick(delta_ms) {
            self.input.clear();
        }
        self.check_game_over();
    }

    fn check_game_over(&mut self) {
        if self.game.is_over() {
            self.finish();
        }
    }

    /// End the current game, record it in history and show the summary.
    pub fn finish(&mut self) {
        if self.screen != AppScreen::Playing {
            return;
        }
        let result = self.game.result(self.mode);
        info!(
            mode = %result.mode,
            score = result.score,
            accuracy = result.accuracy,
            "game finished"
        );
        if result.attempts() > 0
            && let Some(store) = &self.store
        {
            if let Err(e) = store.append_result(&result) {
                warn!(error = %e, "failed to save session history");
            }
            self.best_score = self.best_score.max(Some(result.score));
        }
        self.last_result = Some(result);
        self.screen = AppScreen::Summary;
    }

    /// Start a new game in the same mode. Weights learned so far carry over.
    pub fn restart(&mut self) -> Result<()> {
        if let Some(pool) = self.current_pool() {
            self.pool = pool;
        }
        self.game = build_game(
            &self.config,
            self.mode,
            self.pool.clone(),
            observer(&self.store),
            &mut self.rng,
        )?;
        self.input.clear();
        self.screen = AppScreen::Playing;
        Ok(())
    }

    fn current_pool(&self) -> Option<WeightedCharacterPool> {
        match &self.game {
            Game::Classic(session)
            | Game::Falling { session, .. }
            | Game::Spiral { session, .. } => Some(session.pool().clone()),
            Game::Snake(snake) => Some(snake.pool().clone()),
        }
    }
}

fn observer(store: &Option<JsonStore>) -> Box<dyn SessionObserver> {
    let Some(store) = store else {
        return Box::new(NoopObserver);
    };
    match JsonStore::with_base_dir(store.base_dir().to_path_buf()) {
        Ok(store) => Box::new(StoreObserver::new(store)),
        Err(e) => {
            warn!(error = %e, "stats recording disabled");
            Box::new(NoopObserver)
        }
    }
}

fn build_game(
    config: &Config,
    mode: Mode,
    pool: WeightedCharacterPool,
    observer: Box<dyn SessionObserver>,
    rng: &mut SmallRng,
) -> Result<Game> {
    let base = config.session_settings()?;
    let session_rng = SmallRng::from_rng(&mut *rng)?;
    let game = match mode {
        Mode::Classic => Game::Classic(QuizSession::with_rng(pool, base, observer, session_rng)?),
        Mode::Falling => {
            let settings = config.falling_settings();
            let session = QuizSession::with_rng(
                pool,
                settings.session_settings(base),
                observer,
                session_rng,
            )?;
            let mut grid = FallingGrid::new(settings, SmallRng::from_rng(&mut *rng)?)?;
            grid.attach(&session);
            Game::Falling { session, grid }
        }
        Mode::Spiral => {
            let settings = config.spiral_settings();
            let session = QuizSession::with_rng(
                pool,
                settings.session_settings(base),
                observer,
                session_rng,
            )?;
            let mut spiral = Spiral::new(settings)?;
            spiral.attach(&session);
            Game::Spiral { session, spiral }
        }
        Mode::Snake => Game::Snake(SnakeMode::new(
            pool,
            base,
            config.snake_settings(),
            observer,
            session_rng,
        )?),
    };
    Ok(game)
}
