use std::time::{Duration, Instant};

/// Period between streaming fetches.
pub const STREAM_PERIOD: Duration = Duration::from_secs(3);

/// Shortest accepted period; smaller values are raised to it.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Repeating timer driven by the caller's event loop.
///
/// The scheduler owns a single timer handle, the next due instant. It never
/// sleeps; the owner polls [`StreamScheduler::poll_due`] with the current
/// time.
#[derive(Debug, Clone)]
pub struct StreamScheduler {
    period: Duration,
    next_due: Option<Instant>,
}

impl StreamScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_PERIOD),
            next_due: None,
        }
    }

    /// Arms the timer. Returns `false` if it was already armed.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.next_due.is_some() {
            return false;
        }
        self.next_due = Some(now + self.period);
        true
    }

    /// Disarms the timer. Returns `false` if it was not armed.
    pub fn stop(&mut self) -> bool {
        self.next_due.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Reports whether a tick fired at or before `now`.
    ///
    /// Missed ticks collapse into one, so a stalled loop fires once and
    /// resumes the regular cadence.
    pub fn poll_due(&mut self, now: Instant) -> bool {
        let Some(due) = self.next_due else {
            return false;
        };
        if now < due {
            return false;
        }

        let mut next = due + self.period;
        while next <= now {
            next += self.period;
        }
        self.next_due = Some(next);
        true
    }

    /// Time left until the next tick, if armed.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}

impl Default for StreamScheduler {
    fn default() -> Self {
        Self::new(STREAM_PERIOD)
    }
}
