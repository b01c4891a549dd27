use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// One-shot timers with cancellation. The owner of the scheduler drains due
/// timers with `take_due` and hands each id back to whichever state machine
/// armed it.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId;
    fn cancel(&mut self, id: TimerId);
    /// Removes and returns every timer whose deadline has passed, earliest
    /// first.
    fn take_due(&mut self) -> Vec<TimerId>;
}

/// Deadlines against the real clock; polled from the terminal event loop.
#[derive(Debug, Default)]
pub struct WallClockScheduler {
    next_id: u64,
    pending: Vec<(TimerId, Instant)>,
}

impl WallClockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Time until the earliest deadline, if anything is armed.
    pub fn until_next(&self) -> Option<Duration> {
        let now = Instant::now();
        self.pending
            .iter()
            .map(|(_, at)| at.saturating_duration_since(now))
            .min()
    }
}

impl Scheduler for WallClockScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push((id, Instant::now() + delay));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|(pending, _)| *pending != id);
    }

    fn take_due(&mut self) -> Vec<TimerId> {
        let now = Instant::now();
        let mut due: Vec<(TimerId, Instant)> = Vec::new();
        self.pending.retain(|&(id, at)| {
            if at <= now {
                due.push((id, at));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(_, at)| at);
        due.into_iter().map(|(id, _)| id).collect()
    }
}

/// Millisecond clock that only moves when told to.
#[derive(Debug, Default)]
pub struct VirtualScheduler {
    now_ms: u64,
    next_id: u64,
    pending: Vec<(TimerId, u64)>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, by: Duration) {
        self.now_ms += by.as_millis() as u64;
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|(pending, _)| *pending == id)
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push((id, self.now_ms + delay.as_millis() as u64));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|(pending, _)| *pending != id);
    }

    fn take_due(&mut self) -> Vec<TimerId> {
        let now = self.now_ms;
        let mut due: Vec<(TimerId, u64)> = Vec::new();
        self.pending.retain(|&(id, at)| {
            if at <= now {
                due.push((id, at));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(id, at)| (at, id.0));
        due.into_iter().map(|(id, _)| id).collect()
    }
}
