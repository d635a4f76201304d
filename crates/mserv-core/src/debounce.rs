use std::time::{Duration, Instant};

/// Trailing-edge debouncer driven by an explicit clock
///
/// Every `schedule` replaces the pending value and pushes the deadline out
/// by `delay`. `poll` hands the value back once the deadline has passed, at
/// most once per burst.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Returns true when this replaced a value that hadn't fired yet
    pub fn schedule(&mut self, now: Instant, value: T) -> bool {
        let replaced = self.pending.is_some();
        self.pending = Some((now + self.delay, value));
        replaced
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due_at(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(due, _)| *due)
    }

    /// Time left before the pending value fires, zero if overdue
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.due_at().map(|due| due.saturating_duration_since(now))
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((due, _)) if *due <= now => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
