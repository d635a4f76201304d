use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const DEFAULT_DURATION: Duration = Duration::from_secs(3);
pub const ERROR_DURATION: Duration = Duration::from_secs(5);

/// At most this many toasts are kept; older ones are dropped first
const MAX_ACTIVE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Error => "✗",
            Self::Warning => "⚠",
            Self::Info => "ℹ",
        }
    }

    /// How long a toast of this kind stays up by default
    pub fn duration(self) -> Duration {
        match self {
            Self::Error => ERROR_DURATION,
            _ => DEFAULT_DURATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub expires_at: Instant,
}

/// Transient toasts, newest last
#[derive(Debug, Default)]
pub struct NotificationCenter {
    active: VecDeque<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, now: Instant, kind: NotificationKind, message: impl Into<String>) {
        self.push_for(now, kind, message, kind.duration());
    }

    pub fn push_for(
        &mut self,
        now: Instant,
        kind: NotificationKind,
        message: impl Into<String>,
        duration: Duration,
    ) {
        if self.active.len() == MAX_ACTIVE {
            self.active.pop_front();
        }
        self.active.push_back(Notification {
            message: message.into(),
            kind,
            expires_at: now + duration,
        });
    }

    /// Drop expired toasts. Returns true if anything was removed.
    pub fn prune(&mut self, now: Instant) -> bool {
        let before = self.active.len();
        self.active.retain(|n| n.expires_at > now);
        before != self.active.len()
    }

    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        self.active.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Time until the next toast disappears
    pub fn next_expiry(&self, now: Instant) -> Option<Duration> {
        self.active
            .iter()
            .map(|n| n.expires_at.saturating_duration_since(now))
            .min()
    }
}
