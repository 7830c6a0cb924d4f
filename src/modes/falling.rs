use rand::Rng;
use rand::rngs::SmallRng;
use tracing::debug;

use crate::engine::SessionError;
use crate::session::quiz::{Phase, QuizSession, SessionEvent, SessionSettings};

#[derive(Clone, Debug)]
pub struct FallingSettings {
    pub columns: usize,
    pub rows: usize,
    pub fall_interval_ms: u64,
    pub min_fall_interval_ms: u64,
    /// Multiplied into the fall interval after every correct answer.
    pub acceleration: f64,
}

impl Default for FallingSettings {
    fn default() -> Self {
        Self {
            columns: 6,
            rows: 12,
            fall_interval_ms: 600,
            min_fall_interval_ms: 150,
            acceleration: 0.96,
        }
    }
}

impl FallingSettings {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.columns == 0 || self.rows < 2 {
            return Err(SessionError::InvalidMode(format!(
                "falling grid needs at least 1 column and 2 rows (got {}x{})",
                self.columns, self.rows
            )));
        }
        if self.fall_interval_ms == 0 || self.min_fall_interval_ms == 0 {
            return Err(SessionError::InvalidMode(
                "fall interval must be positive".to_string(),
            ));
        }
        if !(self.acceleration > 0.0 && self.acceleration <= 1.0) {
            return Err(SessionError::InvalidMode(format!(
                "acceleration {} must be in (0, 1]",
                self.acceleration
            )));
        }
        Ok(())
    }

    /// The block landing is what times a character out in this mode, so the
    /// session clock only needs to outlast the slowest possible fall.
    pub fn session_settings(&self, base: SessionSettings) -> SessionSettings {
        SessionSettings {
            time_limit_ms: self.fall_interval_ms * (self.rows as u64 + 1),
            compression: None,
            lookahead: 0,
            ..base
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallingBlock {
    pub glyph: String,
    pub column: usize,
    pub row: usize,
}

pub struct FallingGrid {
    settings: FallingSettings,
    /// Landed glyphs per column, bottom first.
    stacks: Vec<Vec<String>>,
    active: Option<FallingBlock>,
    fall_interval_ms: u64,
    since_step_ms: u64,
    cleared: u32,
    topped_out: bool,
    rng: SmallRng,
}

impl FallingGrid {
    pub fn new(settings: FallingSettings, rng: SmallRng) -> Result<Self, SessionError> {
        settings.validate()?;
        Ok(Self {
            stacks: vec![Vec::new(); settings.columns],
            active: None,
            fall_interval_ms: settings.fall_interval_ms,
            since_step_ms: 0,
            cleared: 0,
            topped_out: false,
            rng,
            settings,
        })
    }

    /// Spawn a block for whatever the session is currently presenting.
    pub fn attach(&mut self, session: &QuizSession) {
        let glyph = session.current_character().glyph.clone();
        self.spawn(glyph);
    }

    pub fn input_changed(&mut self, session: &mut QuizSession, text: &str) -> Vec<SessionEvent> {
        if self.topped_out {
            return Vec::new();
        }
        // The block for a timed-out character landed before the pause.
        if session.is_paused() && self.active.is_none() {
            self.attach(session);
        }
        let events = session.input_changed(text);
        self.apply(&events);
        events
    }

    pub fn tick(&mut self, session: &mut QuizSession, delta_ms: u64) -> Vec<SessionEvent> {
        if self.topped_out {
            return Vec::new();
        }
        let mut events = session.tick(delta_ms);
        self.apply(&events);

        if session.phase() != Phase::Presenting || self.active.is_none() {
            self.since_step_ms = 0;
            return events;
        }
        self.since_step_ms += delta_ms;
        while self.since_step_ms >= self.fall_interval_ms {
            self.since_step_ms -= self.fall_interval_ms;
            if self.step_active() {
                let landed = session.expire_current();
                self.apply(&landed);
                events.extend(landed);
                self.since_step_ms = 0;
                break;
            }
        }
        events
    }

    /// Moves the active block down one row. True once it sits on the lowest
    /// free row of its column.
    fn step_active(&mut self) -> bool {
        let Some(column) = self.active.as_ref().map(|b| b.column) else {
            return false;
        };
        let floor = self.floor_row(column);
        let Some(block) = self.active.as_mut() else {
            return false;
        };
        if block.row < floor {
            block.row += 1;
        }
        block.row >= floor
    }

    fn apply(&mut self, events: &[SessionEvent]) {
        for event in events {
            match event {
                SessionEvent::Correct { .. } => {
                    self.active = None;
                    self.cleared += 1;
                    let faster = (self.fall_interval_ms as f64 * self.settings.acceleration) as u64;
                    self.fall_interval_ms = faster.max(self.settings.min_fall_interval_ms);
                }
                SessionEvent::Incorrect { .. } | SessionEvent::TimedOut { .. } => self.land(),
                SessionEvent::Advanced { glyph } => self.spawn(glyph.clone()),
                SessionEvent::Paused | SessionEvent::Resumed => {}
            }
        }
    }

    fn land(&mut self) {
        let Some(block) = self.active.take() else {
            return;
        };
        let stack = &mut self.stacks[block.column];
        stack.push(block.glyph);
        if stack.len() >= self.settings.rows {
            debug!(target: "falling", column = block.column, "column full");
            self.topped_out = true;
        }
    }

    fn spawn(&mut self, glyph: String) {
        if self.topped_out {
            return;
        }
        let open: Vec<usize> = (0..self.settings.columns)
            .filter(|&c| self.stacks[c].len() < self.settings.rows)
            .collect();
        if open.is_empty() {
            self.topped_out = true;
            return;
        }
        let column = open[self.rng.gen_range(0..open.len())];
        self.active = Some(FallingBlock {
            glyph,
            column,
            row: 0,
        });
        self.since_step_ms = 0;
    }

    fn floor_row(&self, column: usize) -> usize {
        (self.settings.rows - 1).saturating_sub(self.stacks[column].len())
    }

    pub fn active(&self) -> Option<&FallingBlock> {
        self.active.as_ref()
    }

    pub fn stacks(&self) -> &[Vec<String>] {
        &self.stacks
    }

    pub fn settings(&self) -> &FallingSettings {
        &self.settings
    }

    pub fn fall_interval_ms(&self) -> u64 {
        self.fall_interval_ms
    }

    pub fn cleared(&self) -> u32 {
        self.cleared
    }

    pub fn is_over(&self) -> bool {
        self.topped_out
    }

    /// Glyph at (column, row) with row 0 at the top, landed or falling.
    pub fn cell(&self, column: usize, row: usize) -> Option<&str> {
        if let Some(b) = &self.active
            && b.column == column
            && b.row == row
        {
            return Some(&b.glyph);
        }
        let stack = self.stacks.get(column)?;
        let height_from_bottom = self.settings.rows.checked_sub(row + 1)?;
        stack.get(height_from_bottom).map(String::as_str)
    }
}
