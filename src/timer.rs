use std::time::Duration;

/// Canonical tick cadence of the session clock.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Result of advancing the clock by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickSignal {
    /// Time moved forward.
    Advanced,
    /// The limit was reached on this tick. Raised once per run.
    Expired,
    /// The clock is not running; nothing changed.
    Stopped,
}

/// Session clock. Only reports time; deciding what expiry means for a
/// session is left to the policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerController {
    elapsed: Duration,
    limit: Option<Duration>,
    running: bool,
    expired: bool,
}

impl TimerController {
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            elapsed: Duration::ZERO,
            limit,
            running: false,
            expired: false,
        }
    }

    pub fn start(&mut self) {
        if !self.expired {
            self.running = true;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Back to zero and stopped, keeping the limit.
    pub fn reset(&mut self) {
        *self = Self::new(self.limit);
    }

    pub fn advance(&mut self, by: Duration) -> TickSignal {
        if !self.running {
            return TickSignal::Stopped;
        }

        self.elapsed = self.elapsed.saturating_add(by);

        match self.limit {
            Some(limit) if self.elapsed >= limit => {
                self.elapsed = limit;
                self.running = false;
                self.expired = true;
                TickSignal::Expired
            }
            _ => TickSignal::Advanced,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_expired(&self) -> bool {
        self.expired
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// `limit - elapsed`, clamped at zero. `None` for unbounded clocks.
    pub fn remaining(&self) -> Option<Duration> {
        self.limit.map(|limit| limit.saturating_sub(self.elapsed))
    }

    pub fn remaining_secs(&self) -> Option<f64> {
        self.remaining().map(|r| r.as_secs_f64())
    }
}
