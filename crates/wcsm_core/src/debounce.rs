use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// One gate shared by every target: a burst of changes yields at most one
/// grab per interval, not one per target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer {
    interval_ms: u64,
    last_accepted_ms: Option<u64>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            last_accepted_ms: None,
        }
    }

    /// Like [`Debouncer::accept_at`] with the current wall clock.
    pub fn accept(&mut self) -> bool {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        self.accept_at(now_ms)
    }

    /// Accept when more than the interval has passed since the last accepted call.
    pub fn accept_at(&mut self, now_ms: u64) -> bool {
        let proceed = match self.last_accepted_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.interval_ms,
        };
        if proceed {
            self.last_accepted_ms = Some(now_ms);
        }
        proceed
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
