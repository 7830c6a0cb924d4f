use std::collections::VecDeque;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::SessionError;
use crate::engine::combo::{ComboState, ComboTable};
use crate::engine::matcher::{self, Match};
use crate::engine::pool::{PracticeCharacter, WeightedCharacterPool};
use crate::engine::timer::{CountdownTimer, Tick};
use crate::session::observer::SessionObserver;
use crate::session::result::{SessionResult, SessionTally};
use crate::session::scheduler::Scheduler;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimerCompression {
    /// Applied to the current time limit each time the combo tier goes up.
    pub factor: f64,
    pub min_time_limit_ms: u64,
}

#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub time_limit_ms: u64,
    pub wrong_answer_delay_ms: u64,
    /// Consecutive timeouts before the session pauses itself.
    pub pause_after_timeouts: u32,
    pub weight_increase: f64,
    pub weight_decrease: f64,
    pub combo_table: ComboTable,
    pub compression: Option<TimerCompression>,
    pub avoid_repeats: bool,
    /// Characters drawn ahead of the current one.
    pub lookahead: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            time_limit_ms: 5000,
            wrong_answer_delay_ms: 1000,
            pause_after_timeouts: 2,
            weight_increase: 2.0,
            weight_decrease: 1.0,
            combo_table: ComboTable::standard(),
            compression: Some(TimerCompression {
                factor: 0.85,
                min_time_limit_ms: 1500,
            }),
            avoid_repeats: true,
            lookahead: 0,
        }
    }
}

impl SessionSettings {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.time_limit_ms == 0 {
            return Err(SessionError::ZeroTimeLimit);
        }
        if self.pause_after_timeouts == 0 {
            return Err(SessionError::ZeroPauseThreshold);
        }
        if let Some(c) = self.compression {
            if !(c.factor > 0.0 && c.factor <= 1.0) {
                return Err(SessionError::InvalidCompression(c.factor));
            }
            if c.min_time_limit_ms == 0 {
                return Err(SessionError::ZeroTimeLimit);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    Presenting,
    /// A miss was shown; the advance to the next character is scheduled.
    Resolving,
    /// Waiting for any input after too many timeouts in a row.
    Paused,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Correct {
        glyph: String,
        points: u32,
        tier_up: bool,
    },
    Incorrect {
        glyph: String,
        expected: String,
    },
    TimedOut {
        glyph: String,
        expected: String,
    },
    Advanced {
        glyph: String,
    },
    Paused,
    Resumed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MissKind {
    Typed,
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transition {
    Advance,
    Pause,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub glyph: String,
    pub pending_input: String,
    pub score: u64,
    pub streak: u32,
    pub highest_streak: u32,
    pub combo_multiplier: f64,
    pub wrong_answer_flash: bool,
    /// Canonical answer of the character just missed, while the flash lasts.
    pub reveal: Option<String>,
    pub time_remaining_ms: u64,
    pub time_total_ms: u64,
    pub paused: bool,
    pub phase: Phase,
    pub upcoming: Vec<String>,
}

pub struct QuizSession {
    settings: SessionSettings,
    pool: WeightedCharacterPool,
    current: usize,
    upcoming: VecDeque<usize>,
    pending_input: String,
    combo: ComboState,
    timer: CountdownTimer,
    time_limit_ms: u64,
    phase: Phase,
    wrong_flash: bool,
    reveal: Option<String>,
    consecutive_timeouts: u32,
    scheduler: Scheduler<Transition>,
    observer: Box<dyn SessionObserver>,
    rng: SmallRng,
    tally: SessionTally,
}

impl QuizSession {
    pub fn new(
        pool: WeightedCharacterPool,
        settings: SessionSettings,
        observer: Box<dyn SessionObserver>,
    ) -> Result<Self, SessionError> {
        Self::with_rng(pool, settings, observer, SmallRng::from_entropy())
    }

    pub fn with_rng(
        pool: WeightedCharacterPool,
        settings: SessionSettings,
        observer: Box<dyn SessionObserver>,
        rng: SmallRng,
    ) -> Result<Self, SessionError> {
        settings.validate()?;
        if pool.is_empty() {
            return Err(SessionError::EmptyPool);
        }
        let time_limit_ms = settings.time_limit_ms;
        let mut session = Self {
            settings,
            pool,
            current: 0,
            upcoming: VecDeque::new(),
            pending_input: String::new(),
            combo: ComboState::default(),
            timer: CountdownTimer::new(),
            time_limit_ms,
            phase: Phase::Presenting,
            wrong_flash: false,
            reveal: None,
            consecutive_timeouts: 0,
            scheduler: Scheduler::new(),
            observer,
            rng,
            tally: SessionTally::default(),
        };
        session.present_first();
        info!(
            target: "session",
            characters = session.pool.len(),
            time_limit_ms,
            "session started"
        );
        Ok(session)
    }

    /// Throw away score, streak and pending transitions and start over with
    /// a fresh draw. Pool weights are kept.
    pub fn restart(&mut self) {
        self.scheduler.cancel_all();
        self.combo = ComboState::default();
        self.tally = SessionTally::default();
        self.time_limit_ms = self.settings.time_limit_ms;
        self.consecutive_timeouts = 0;
        self.upcoming.clear();
        self.present_first();
        info!(target: "session", "session restarted");
    }

    fn present_first(&mut self) {
        self.current = self.pool.draw_index(&mut self.rng);
        self.refill_upcoming();
        self.present();
    }

    /// Feed the full current text of the answer field.
    pub fn input_changed(&mut self, text: &str) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match self.phase {
            Phase::Resolving => return events,
            Phase::Paused => {
                self.time_limit_ms = self.settings.time_limit_ms;
                self.timer.start(self.time_limit_ms);
                self.phase = Phase::Presenting;
                debug!(target: "session", "resumed by input");
                events.push(SessionEvent::Resumed);
            }
            Phase::Presenting => {}
        }

        match matcher::classify(text, &self.current_character().answers) {
            Match::Exact => self.resolve_correct(&mut events),
            Match::Miss => {
                self.pending_input = text.to_string();
                self.resolve_miss(MissKind::Typed, &mut events);
            }
            Match::Prefix => self.pending_input = text.to_string(),
            Match::Empty => self.pending_input.clear(),
        }
        events
    }

    /// Advance the clock. While presenting this runs the countdown; while
    /// resolving it runs the pending transition; while paused it does nothing.
    pub fn tick(&mut self, delta_ms: u64) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match self.phase {
            Phase::Presenting => {
                self.tally.elapsed_ms += delta_ms;
                if self.timer.tick(delta_ms) == Tick::Expired {
                    self.resolve_miss(MissKind::Timeout, &mut events);
                }
            }
            Phase::Resolving => {
                self.tally.elapsed_ms += delta_ms;
                for transition in self.scheduler.tick(delta_ms) {
                    match transition {
                        Transition::Advance => self.advance(&mut events),
                        Transition::Pause => self.enter_pause(&mut events),
                    }
                }
            }
            Phase::Paused => {}
        }
        events
    }

    /// Resolve the current character as a timeout right now. Used by modes
    /// whose own clock (a falling block hitting the floor) runs out first.
    pub fn expire_current(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase == Phase::Presenting {
            self.resolve_miss(MissKind::Timeout, &mut events);
        }
        events
    }

    fn resolve_correct(&mut self, events: &mut Vec<SessionEvent>) {
        let glyph = self.current_character().glyph.clone();
        self.observer.on_attempt(&glyph, true);

        let gain = self.combo.record_correct(&self.settings.combo_table);
        self.adjust_weight(&glyph, -self.settings.weight_decrease);
        if gain.tier_up
            && let Some(c) = self.settings.compression
        {
            let compressed = (self.time_limit_ms as f64 * c.factor) as u64;
            self.time_limit_ms = compressed.max(c.min_time_limit_ms);
        }
        self.consecutive_timeouts = 0;
        self.tally.correct += 1;

        debug!(
            target: "session",
            glyph = %glyph,
            points = gain.points,
            streak = self.combo.streak,
            multiplier = gain.multiplier,
            "correct"
        );
        events.push(SessionEvent::Correct {
            glyph,
            points: gain.points,
            tier_up: gain.tier_up,
        });
        self.advance(events);
    }

    fn resolve_miss(&mut self, kind: MissKind, events: &mut Vec<SessionEvent>) {
        let current = self.current_character();
        let glyph = current.glyph.clone();
        let expected = current.canonical_answer().to_string();
        self.observer.on_attempt(&glyph, false);

        self.combo.record_miss();
        self.adjust_weight(&glyph, self.settings.weight_increase);
        self.time_limit_ms = self.settings.time_limit_ms;
        self.timer.stop();
        self.wrong_flash = true;
        self.reveal = Some(expected.clone());
        self.phase = Phase::Resolving;

        let transition = match kind {
            MissKind::Typed => {
                self.consecutive_timeouts = 0;
                self.tally.incorrect += 1;
                debug!(target: "session", glyph = %glyph, input = %self.pending_input, "incorrect");
                events.push(SessionEvent::Incorrect { glyph, expected });
                Transition::Advance
            }
            MissKind::Timeout => {
                self.consecutive_timeouts += 1;
                self.tally.timeouts += 1;
                debug!(
                    target: "session",
                    glyph = %glyph,
                    consecutive = self.consecutive_timeouts,
                    "timed out"
                );
                events.push(SessionEvent::TimedOut { glyph, expected });
                if self.consecutive_timeouts >= self.settings.pause_after_timeouts {
                    Transition::Pause
                } else {
                    Transition::Advance
                }
            }
        };
        self.scheduler
            .schedule(self.settings.wrong_answer_delay_ms, transition);
    }

    fn adjust_weight(&mut self, glyph: &str, delta: f64) {
        if self.pool.adjust_weight(glyph, delta).is_some() {
            self.observer.on_weights_changed(&self.pool);
        }
    }

    fn advance(&mut self, events: &mut Vec<SessionEvent>) {
        self.scheduler.cancel_all();
        let previous = self.current;
        self.current = match self.upcoming.pop_front() {
            Some(next) => next,
            None => self.draw_after(previous),
        };
        self.refill_upcoming();
        self.present();
        events.push(SessionEvent::Advanced {
            glyph: self.current_character().glyph.clone(),
        });
    }

    fn present(&mut self) {
        self.pending_input.clear();
        self.wrong_flash = false;
        self.reveal = None;
        self.timer.reset(self.time_limit_ms);
        self.phase = Phase::Presenting;
    }

    /// Park on the character that just timed out. Resuming retries it.
    fn enter_pause(&mut self, events: &mut Vec<SessionEvent>) {
        self.scheduler.cancel_all();
        self.timer.stop();
        self.pending_input.clear();
        self.wrong_flash = false;
        self.reveal = None;
        self.consecutive_timeouts = 0;
        self.phase = Phase::Paused;
        info!(
            target: "session",
            glyph = %self.current_character().glyph,
            "paused after repeated timeouts"
        );
        events.push(SessionEvent::Paused);
    }

    fn draw_after(&mut self, previous: usize) -> usize {
        if self.settings.avoid_repeats {
            let glyph = self.pool.characters()[previous].glyph.clone();
            self.pool.draw_excluding(&glyph, &mut self.rng)
        } else {
            self.pool.draw_index(&mut self.rng)
        }
    }

    fn refill_upcoming(&mut self) {
        while self.upcoming.len() < self.settings.lookahead {
            let tail = self.upcoming.back().copied().unwrap_or(self.current);
            let next = self.draw_after(tail);
            self.upcoming.push_back(next);
        }
    }

    pub fn current_character(&self) -> &PracticeCharacter {
        &self.pool.characters()[self.current]
    }

    pub fn upcoming(&self) -> impl Iterator<Item = &PracticeCharacter> {
        self.upcoming.iter().map(|&i| &self.pool.characters()[i])
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn combo(&self) -> &ComboState {
        &self.combo
    }

    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    pub fn pool(&self) -> &WeightedCharacterPool {
        &self.pool
    }

    pub fn tally(&self) -> &SessionTally {
        &self.tally
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn consecutive_timeouts(&self) -> u32 {
        self.consecutive_timeouts
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            glyph: self.current_character().glyph.clone(),
            pending_input: self.pending_input.clone(),
            score: self.combo.score,
            streak: self.combo.streak,
            highest_streak: self.combo.highest_streak,
            combo_multiplier: self.combo.multiplier,
            wrong_answer_flash: self.wrong_flash,
            reveal: self.reveal.clone(),
            time_remaining_ms: self.timer.remaining_ms(),
            time_total_ms: self.timer.total_ms(),
            paused: self.is_paused(),
            phase: self.phase,
            upcoming: self.upcoming().map(|c| c.glyph.clone()).collect(),
        }
    }

    pub fn result(&self, mode: &str) -> SessionResult {
        SessionResult::new(
            mode,
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

    fn pool(chars: &[(&str, &[&str])]) -> WeightedCharacterPool {
        WeightedCharacterPool::new(
            chars
                .iter()
                .map(|(g, a)| PracticeCharacter::new(g, a, 5.0))
                .collect(),
        )
        .unwrap()
    }

    fn session_with(
        chars: &[(&str, &[&str])],
        settings: SessionSettings,
    ) -> (QuizSession, RecordingObserver) {
        let observer = RecordingObserver::default();
        let session = QuizSession::with_rng(
            pool(chars),
            settings,
            Box::new(observer.clone()),
            SmallRng::seed_from_u64(42),
        )
        .unwrap();
        (session, observer)
    }

    fn single(glyph: &str, answers: &[&str]) -> (QuizSession, RecordingObserver) {
        session_with(&[(glyph, answers)], SessionSettings::default())
    }

    #[test]
    fn test_invalid_settings_fail_fast() {
        let bad = [
            SessionSettings {
                time_limit_ms: 0,
                ..SessionSettings::default()
            },
            SessionSettings {
                pause_after_timeouts: 0,
                ..SessionSettings::default()
            },
            SessionSettings {
                compression: Some(TimerCompression {
                    factor: 1.5,
                    min_time_limit_ms: 100,
                }),
                ..SessionSettings::default()
            },
        ];
        for settings in bad {
            let result = QuizSession::new(
                pool(&[("あ", &["a"])]),
                settings,
                Box::new(crate::session::observer::NoopObserver),
            );
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_correct_answer_scores_and_advances() {
        let (mut s, obs) = single("あ", &["a"]);
        let events = s.input_changed("a");
        assert_eq!(
            events,
            vec![
                SessionEvent::Correct {
                    glyph: "あ".to_string(),
                    points: 10,
                    tier_up: false,
                },
                SessionEvent::Advanced {
                    glyph: "あ".to_string(),
                },
            ]
        );
        let snap = s.snapshot();
        assert_eq!(snap.score, 10);
        assert_eq!(snap.streak, 1);
        assert_eq!(snap.combo_multiplier, 1.0);
        assert_eq!(snap.pending_input, "");
        assert_eq!(snap.phase, Phase::Presenting);
        assert_eq!(obs.log.borrow().attempts, vec![("あ".to_string(), true)]);
        assert_eq!(s.pool().get("あ").unwrap().weight, 4.0);
        assert_eq!(obs.log.borrow().weight_writes, 1);
    }

    #[test]
    fn test_tenth_streak_scores_with_multiplier() {
        let (mut s, _) = single("あ", &["a"]);
        for _ in 0..9 {
            s.input_changed("a");
        }
        assert_eq!(s.combo().score, 90);
        let events = s.input_changed("a");
        assert!(matches!(
            events[0],
            SessionEvent::Correct {
                points: 15,
                tier_up: true,
                ..
            }
        ));
        assert_eq!(s.combo().streak, 10);
        assert_eq!(s.combo().multiplier, 1.5);
        assert_eq!(s.combo().score, 105);
    }

    #[test]
    fn test_valid_prefix_is_held() {
        let (mut s, obs) = single("し", &["shi", "si"]);
        let events = s.input_changed("s");
        assert!(events.is_empty());
        assert_eq!(s.pending_input(), "s");
        assert_eq!(s.phase(), Phase::Presenting);
        assert!(obs.log.borrow().attempts.is_empty());
        assert_eq!(obs.log.borrow().weight_writes, 0);
    }

    #[test]
    fn test_invalid_prefix_is_a_miss() {
        let (mut s, obs) = single("し", &["shi", "si"]);
        s.input_changed("s");
        s.input_changed("sh");
        let events = s.input_changed("sho");
        assert_eq!(
            events,
            vec![SessionEvent::Incorrect {
                glyph: "し".to_string(),
                expected: "shi".to_string(),
            }]
        );
        let snap = s.snapshot();
        assert_eq!(snap.streak, 0);
        assert!(snap.wrong_answer_flash);
        assert_eq!(snap.reveal.as_deref(), Some("shi"));
        assert_eq!(snap.phase, Phase::Resolving);
        assert_eq!(obs.log.borrow().attempts, vec![("し".to_string(), false)]);
        assert_eq!(s.pool().get("し").unwrap().weight, 7.0);
        // Typed misses do not count toward the pause threshold.
        assert_eq!(s.consecutive_timeouts(), 0);
    }

    #[test]
    fn test_miss_resets_streak_after_run() {
        let (mut s, _) = single("し", &["shi", "si"]);
        s.input_changed("si");
        s.input_changed("shi");
        assert_eq!(s.combo().streak, 2);
        s.input_changed("x");
        assert_eq!(s.combo().streak, 0);
        assert_eq!(s.combo().multiplier, 1.0);
        assert_eq!(s.combo().highest_streak, 2);
    }

    #[test]
    fn test_empty_input_is_not_a_miss() {
        let (mut s, obs) = single("か", &["ka"]);
        s.input_changed("k");
        let events = s.input_changed("");
        assert!(events.is_empty());
        assert_eq!(s.pending_input(), "");
        assert_eq!(s.phase(), Phase::Presenting);
        assert!(obs.log.borrow().attempts.is_empty());
    }

    #[test]
    fn test_input_ignored_while_resolving() {
        let (mut s, obs) = single("か", &["ka"]);
        s.input_changed("x");
        assert!(s.input_changed("ka").is_empty());
        assert!(s.input_changed("zz").is_empty());
        assert_eq!(obs.log.borrow().attempts.len(), 1);
    }

    #[test]
    fn test_wrong_answer_advances_after_delay() {
        let (mut s, _) = single("か", &["ka"]);
        s.input_changed("x");
        assert!(s.tick(999).is_empty());
        let events = s.tick(1);
        assert_eq!(
            events,
            vec![SessionEvent::Advanced {
                glyph: "か".to_string(),
            }]
        );
        let snap = s.snapshot();
        assert!(!snap.wrong_answer_flash);
        assert_eq!(snap.phase, Phase::Presenting);
        assert_eq!(snap.time_remaining_ms, 5000);
    }

    #[test]
    fn test_timeout_resolves_once() {
        let (mut s, obs) = single("か", &["ka"]);
        let mut timeouts = 0;
        for _ in 0..(5000 / 50) {
            for e in s.tick(50) {
                if matches!(e, SessionEvent::TimedOut { .. }) {
                    timeouts += 1;
                }
            }
        }
        assert_eq!(timeouts, 1);
        assert_eq!(s.phase(), Phase::Resolving);
        assert_eq!(s.consecutive_timeouts(), 1);
        assert_eq!(obs.log.borrow().attempts, vec![("か".to_string(), false)]);
        assert_eq!(s.tally().timeouts, 1);
    }

    #[test]
    fn test_two_timeouts_pause_then_input_resumes() {
        let chars: &[(&str, &[&str])] = &[
            ("あ", &["a"]),
            ("い", &["i"]),
            ("う", &["u"]),
            ("え", &["e"]),
        ];
        let (mut s, obs) = session_with(chars, SessionSettings::default());
        s.tick(5000);
        s.tick(1000);
        assert_eq!(s.phase(), Phase::Presenting);
        let timed_out = s.current_character().glyph.clone();
        let answer = s.current_character().canonical_answer().to_string();

        let ev = s.tick(5000);
        assert!(matches!(ev[0], SessionEvent::TimedOut { .. }));
        let ev = s.tick(1000);
        assert_eq!(ev, vec![SessionEvent::Paused]);
        assert!(s.is_paused());
        assert_eq!(s.current_character().glyph, timed_out);
        assert!(!s.snapshot().wrong_answer_flash);
        assert_eq!(s.snapshot().reveal, None);

        // Paused: the clock does not move.
        assert!(s.tick(60_000).is_empty());
        assert!(!s.timer().is_running());
        assert_eq!(s.current_character().glyph, timed_out);
        assert_eq!(obs.log.borrow().attempts.len(), 2);

        // Any input revives the session on the same character with a full clock.
        let ev = s.input_changed("");
        assert_eq!(ev, vec![SessionEvent::Resumed]);
        assert_eq!(s.phase(), Phase::Presenting);
        assert_eq!(s.current_character().glyph, timed_out);
        assert_eq!(s.timer().total_ms(), 5000);
        assert_eq!(s.timer().remaining_ms(), 5000);

        let ev = s.input_changed(&answer);
        assert!(matches!(&ev[0], SessionEvent::Correct { glyph, .. } if *glyph == timed_out));
        assert_eq!(obs.log.borrow().attempts.len(), 3);
        assert_eq!(obs.log.borrow().attempts[2], (timed_out, true));
    }

    #[test]
    fn test_input_while_paused_is_judged_as_fresh_attempt() {
        let (mut s, obs) = single("か", &["ka"]);
        for _ in 0..2 {
            s.tick(5000);
            s.tick(1000);
        }
        assert!(s.is_paused());
        let ev = s.input_changed("ka");
        assert_eq!(ev[0], SessionEvent::Resumed);
        assert!(matches!(ev[1], SessionEvent::Correct { .. }));
        assert_eq!(s.phase(), Phase::Presenting);
        assert_eq!(obs.log.borrow().attempts.len(), 3);
    }

    #[test]
    fn test_resume_keeps_partial_input() {
        let (mut s, _) = single("か", &["ka"]);
        for _ in 0..2 {
            s.tick(5000);
            s.tick(1000);
        }
        assert!(s.is_paused());
        let ev = s.input_changed("k");
        assert_eq!(ev, vec![SessionEvent::Resumed]);
        assert_eq!(s.pending_input(), "k");
        assert!(s.timer().is_running());
        assert_eq!(s.timer().remaining_ms(), 5000);
    }

    #[test]
    fn test_typed_answer_breaks_timeout_run() {
        let (mut s, _) = single("か", &["ka"]);
        s.tick(5000);
        s.tick(1000);
        s.input_changed("ka");
        s.tick(5000);
        s.tick(1000);
        assert_eq!(s.phase(), Phase::Presenting);
        assert_eq!(s.consecutive_timeouts(), 1);
    }

    #[test]
    fn test_restart_cancels_stale_transition() {
        let (mut s, obs) = single("か", &["ka"]);
        s.input_changed("x");
        assert_eq!(s.phase(), Phase::Resolving);
        s.restart();
        assert_eq!(s.phase(), Phase::Presenting);

        // The old one-second advance must not fire on the new character.
        assert!(s.tick(1000).is_empty());
        assert_eq!(s.snapshot().time_remaining_ms, 4000);

        let mut timeouts = 0;
        let mut advances = 0;
        for _ in 0..40 {
            for e in s.tick(100) {
                match e {
                    SessionEvent::TimedOut { .. } => timeouts += 1,
                    SessionEvent::Advanced { .. } => advances += 1,
                    _ => {}
                }
            }
        }
        assert_eq!(timeouts, 1);
        assert_eq!(advances, 0);
        assert_eq!(s.phase(), Phase::Resolving);
        assert_eq!(obs.log.borrow().attempts.len(), 2);
        assert_eq!(s.combo().score, 0);
    }

    #[test]
    fn test_expire_current_is_a_timeout() {
        let (mut s, _) = single("か", &["ka"]);
        let ev = s.expire_current();
        assert!(matches!(ev[0], SessionEvent::TimedOut { .. }));
        assert!(s.expire_current().is_empty());
        assert_eq!(s.tally().timeouts, 1);
    }

    #[test]
    fn test_timer_compresses_on_tier_up() {
        let settings = SessionSettings {
            combo_table: ComboTable::quick(),
            ..SessionSettings::default()
        };
        let (mut s, _) = session_with(&[("あ", &["a"])], settings);
        for _ in 0..4 {
            s.input_changed("a");
        }
        assert_eq!(s.timer().total_ms(), 5000);
        s.input_changed("a");
        assert_eq!(s.timer().total_ms(), 4250);
        s.input_changed("a");
        assert_eq!(s.timer().total_ms(), 4250);

        // A miss restores the default limit for the next character.
        s.input_changed("z");
        s.tick(1000);
        assert_eq!(s.timer().total_ms(), 5000);
    }

    #[test]
    fn test_compression_respects_floor() {
        let settings = SessionSettings {
            combo_table: ComboTable::quick(),
            compression: Some(TimerCompression {
                factor: 0.1,
                min_time_limit_ms: 2000,
            }),
            ..SessionSettings::default()
        };
        let (mut s, _) = session_with(&[("あ", &["a"])], settings);
        for _ in 0..5 {
            s.input_changed("a");
        }
        assert_eq!(s.timer().total_ms(), 2000);
    }

    #[test]
    fn test_avoid_repeats_alternates_two_characters() {
        let (mut s, _) = session_with(&[("あ", &["a"]), ("い", &["i"])], SessionSettings::default());
        let mut prev = s.current_character().glyph.clone();
        for _ in 0..20 {
            let answer = s.current_character().answers[0].clone();
            s.input_changed(&answer);
            let now = s.current_character().glyph.clone();
            assert_ne!(now, prev);
            prev = now;
        }
    }

    #[test]
    fn test_lookahead_queue_advances_in_lockstep() {
        let settings = SessionSettings {
            lookahead: 3,
            ..SessionSettings::default()
        };
        let (mut s, _) = session_with(
            &[("あ", &["a"]), ("い", &["i"]), ("う", &["u"]), ("え", &["e"])],
            settings,
        );
        let queued = s.snapshot().upcoming;
        assert_eq!(queued.len(), 3);
        let answer = s.current_character().answers[0].clone();
        s.input_changed(&answer);
        let snap = s.snapshot();
        assert_eq!(snap.glyph, queued[0]);
        assert_eq!(snap.upcoming[..2], queued[1..]);
        assert_eq!(snap.upcoming.len(), 3);
    }

    #[test]
    fn test_one_attempt_per_resolution() {
        let (mut s, obs) = session_with(
            &[("あ", &["a"]), ("し", &["shi", "si"]), ("つ", &["tsu", "tu"])],
            SessionSettings::default(),
        );
        let mut resolutions = 0;
        for step in 0..300u32 {
            let events = match step % 5 {
                0 => {
                    let answer = s.current_character().answers[0].clone();
                    s.input_changed(&answer)
                }
                1 => s.input_changed("q"),
                _ => s.tick(700),
            };
            resolutions += events
                .iter()
                .filter(|e| {
                    matches!(
                        e,
                        SessionEvent::Correct { .. }
                            | SessionEvent::Incorrect { .. }
                            | SessionEvent::TimedOut { .. }
                    )
                })
                .count();
        }
        assert!(resolutions > 0);
        assert_eq!(obs.log.borrow().attempts.len(), resolutions);
        assert_eq!(s.tally().attempts() as usize, resolutions);
    }

    #[test]
    fn test_result_reflects_session() {
        let (mut s, _) = single("あ", &["a"]);
        s.input_changed("a");
        s.tick(250);
        s.input_changed("x");
        let result = s.result("classic");
        assert_eq!(result.score, 10);
        assert_eq!(result.correct, 1);
        assert_eq!(result.incorrect, 1);
        assert!((result.accuracy - 50.0).abs() < 1e-9);
        assert!((result.elapsed_secs - 0.25).abs() < 1e-9);
    }
}
