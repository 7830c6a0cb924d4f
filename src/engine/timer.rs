#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Running,
    Paused,
    Expired,
    /// Inert until the next `start`/`reset`. Never reports expiry.
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Timer was not running; nothing changed.
    Idle,
    Counting,
    /// Remaining time hit zero on this tick. Reported once per expiry.
    Expired,
}

/// Decrementing clock advanced by the host loop. It has no notion of wall
/// time; whoever calls `tick` decides the step.
#[derive(Clone, Debug)]
pub struct CountdownTimer {
    state: TimerState,
    total_ms: u64,
    remaining_ms: u64,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Stopped,
            total_ms: 0,
            remaining_ms: 0,
        }
    }

    pub fn start(&mut self, total_ms: u64) {
        self.total_ms = total_ms;
        self.remaining_ms = total_ms;
        self.state = TimerState::Running;
    }

    pub fn reset(&mut self, total_ms: u64) {
        self.start(total_ms);
    }

    pub fn tick(&mut self, delta_ms: u64) -> Tick {
        if self.state != TimerState::Running {
            return Tick::Idle;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(delta_ms);
        if self.remaining_ms == 0 {
            self.state = TimerState::Expired;
            Tick::Expired
        } else {
            Tick::Counting
        }
    }

    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
        }
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Stopped;
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn fraction_remaining(&self) -> f64 {
        if self.total_ms == 0 {
            return 0.0;
        }
        self.remaining_ms as f64 / self.total_ms as f64
    }
}
