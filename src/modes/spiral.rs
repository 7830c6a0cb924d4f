use std::collections::VecDeque;
use std::f64::consts::TAU;

use crate::engine::SessionError;
use crate::session::quiz::{QuizSession, SessionEvent, SessionSettings};

#[derive(Clone, Debug)]
pub struct SpiralSettings {
    /// Characters on the spiral, the active one included.
    pub visible: usize,
    /// Full turns the spiral makes from the center to the outermost item.
    pub turns: f64,
}

impl Default for SpiralSettings {
    fn default() -> Self {
        Self {
            visible: 6,
            turns: 1.5,
        }
    }
}

impl SpiralSettings {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.visible == 0 {
            return Err(SessionError::InvalidMode(
                "spiral needs at least one visible character".to_string(),
            ));
        }
        Ok(())
    }

    pub fn session_settings(&self, base: SessionSettings) -> SessionSettings {
        SessionSettings {
            lookahead: self.visible - 1,
            ..base
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpiralItem {
    pub glyph: String,
    /// 0.0 at the center, 1.0 at the rim.
    pub distance: f64,
    /// Radians.
    pub angle: f64,
}

/// Mirror of the session's current character plus its lookahead queue,
/// laid out on a spiral with the active character closest to the center.
pub struct Spiral {
    settings: SpiralSettings,
    items: VecDeque<String>,
}

impl Spiral {
    pub fn new(settings: SpiralSettings) -> Result<Self, SessionError> {
        settings.validate()?;
        Ok(Self {
            settings,
            items: VecDeque::new(),
        })
    }

    pub fn attach(&mut self, session: &QuizSession) {
        self.items.clear();
        self.items
            .push_back(session.current_character().glyph.clone());
        self.items
            .extend(session.upcoming().map(|c| c.glyph.clone()));
    }

    pub fn input_changed(&mut self, session: &mut QuizSession, text: &str) -> Vec<SessionEvent> {
        let events = session.input_changed(text);
        self.apply(session, &events);
        events
    }

    pub fn tick(&mut self, session: &mut QuizSession, delta_ms: u64) -> Vec<SessionEvent> {
        let events = session.tick(delta_ms);
        self.apply(session, &events);
        events
    }

    /// Drop the head and take the session's freshly drawn tail on every
    /// advance.
    fn apply(&mut self, session: &QuizSession, events: &[SessionEvent]) {
        for event in events {
            if let SessionEvent::Advanced { .. } = event {
                self.items.pop_front();
                let tail = session
                    .upcoming()
                    .last()
                    .unwrap_or_else(|| session.current_character());
                self.items.push_back(tail.glyph.clone());
            }
        }
        if !self.is_in_sync(session) {
            self.attach(session);
        }
    }

    pub fn is_in_sync(&self, session: &QuizSession) -> bool {
        let expected = std::iter::once(session.current_character()).chain(session.upcoming());
        self.items.len() == 1 + session.upcoming().count()
            && self
                .items
                .iter()
                .zip(expected)
                .all(|(mine, theirs)| *mine == theirs.glyph)
    }

    pub fn head(&self) -> Option<&str> {
        self.items.front().map(String::as_str)
    }

    pub fn glyphs(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Positions for rendering. `time_fraction` is the share of the active
    /// character's time still left: at 1.0 the head sits one slot out, at
    /// 0.0 it has reached the center.
    pub fn layout(&self, time_fraction: f64) -> Vec<SpiralItem> {
        let n = self.settings.visible.max(self.items.len()) as f64;
        let progress = time_fraction.clamp(0.0, 1.0);
        self.items
            .iter()
            .enumerate()
            .map(|(i, glyph)| {
                let distance = ((i as f64 + progress) / n).min(1.0);
                SpiralItem {
                    glyph: glyph.clone(),
                    distance,
                    angle: distance * self.settings.turns * TAU,
                }
            })
            .collect()
    }
}
