/// Handle for a scheduled transition, unique for the scheduler's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransitionId(u64);

#[derive(Clone, Debug)]
struct Pending<T> {
    id: TransitionId,
    due_in_ms: u64,
    action: T,
}

/// Delayed transitions driven by the same tick as the countdown timer.
///
/// Callers go through `schedule`, which always cancels whatever is pending
/// first. A transition that was cancelled can never be returned from `tick`,
/// so a stale delay from a previous character cannot land on a new one.
#[derive(Clone, Debug)]
pub struct Scheduler<T> {
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, delay_ms: u64, action: T) -> TransitionId {
        self.cancel_all();
        let id = TransitionId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due_in_ms: delay_ms,
            action,
        });
        id
    }

    pub fn cancel(&mut self, id: TransitionId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, id: TransitionId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn remaining_ms(&self) -> Option<u64> {
        self.pending.iter().map(|p| p.due_in_ms).min()
    }

    /// Advance all pending transitions and hand back the ones now due, in
    /// scheduling order.
    pub fn tick(&mut self, delta_ms: u64) -> Vec<T> {
        for p in &mut self.pending {
            p.due_in_ms = p.due_in_ms.saturating_sub(delta_ms);
        }
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due_in_ms == 0);
        self.pending = waiting;
        due.into_iter().map(|p| p.action).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let mut s = Scheduler::new();
        s.schedule(100, "advance");
        assert!(s.tick(60).is_empty());
        assert_eq!(s.remaining_ms(), Some(40));
        assert_eq!(s.tick(40), vec!["advance"]);
        assert!(!s.has_pending());
        assert!(s.tick(1000).is_empty());
    }

    #[test]
    fn test_schedule_cancels_previous() {
        let mut s = Scheduler::new();
        let stale = s.schedule(100, 1);
        let fresh = s.schedule(500, 2);
        assert!(!s.is_pending(stale));
        assert!(s.is_pending(fresh));
        assert!(s.tick(100).is_empty());
        assert_eq!(s.tick(400), vec![2]);
    }

    #[test]
    fn test_cancel_by_id() {
        let mut s = Scheduler::new();
        let id = s.schedule(10, ());
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.tick(10).is_empty());
    }

    #[test]
    fn test_zero_delay_fires_on_next_tick() {
        let mut s = Scheduler::new();
        s.schedule(0, 'x');
        assert_eq!(s.tick(0), vec!['x']);
    }
}
