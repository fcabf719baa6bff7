use std::time::Duration;

use super::{TimerHandle, TimerHost, TimerQueue};

/// Simulated clock for deterministic runs.
///
/// Time only moves when the driver asks for the next due timer or jumps the
/// clock forward. An optional dispatch latency delays every expiry, modelling
/// a host whose callbacks run late.
#[derive(Debug, Default)]
pub struct ManualTimer {
    now: Duration,
    latency: Duration,
    queue: TimerQueue,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every timer fires `latency` after its deadline
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Number of armed timers
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Move the clock to the next timer expiring no later than `until` and
    /// return it. Returns `None` when nothing is due in the window.
    pub fn next_fire(&mut self, until: Duration) -> Option<TimerHandle> {
        let deadline = self.queue.next_deadline()?;
        let fires_at = deadline + self.latency;
        if fires_at > until {
            return None;
        }
        self.now = self.now.max(fires_at);
        self.queue.pop_due(deadline)
    }

    /// Jump the clock forward without firing anything. Never moves backwards.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl TimerHost for ManualTimer {
    fn now(&self) -> Duration {
        self.now
    }

    fn arm(&mut self, delay: Duration) -> TimerHandle {
        self.queue.schedule(self.now + delay)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.queue.cancel(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_within_window() {
        let mut timer = ManualTimer::new();
        let handle = timer.arm(Duration::from_millis(500));
        assert_eq!(timer.next_fire(Duration::from_millis(499)), None);
        assert_eq!(timer.now(), Duration::ZERO);
        assert_eq!(timer.next_fire(Duration::from_millis(500)), Some(handle));
        assert_eq!(timer.now(), Duration::from_millis(500));
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn latency_delays_expiry() {
        let mut timer = ManualTimer::with_latency(Duration::from_millis(7));
        let handle = timer.arm(Duration::from_millis(100));
        assert_eq!(timer.next_fire(Duration::from_millis(106)), None);
        assert_eq!(timer.next_fire(Duration::from_millis(107)), Some(handle));
        assert_eq!(timer.now(), Duration::from_millis(107));
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut timer = ManualTimer::new();
        timer.set_now(Duration::from_secs(2));
        timer.set_now(Duration::from_secs(1));
        assert_eq!(timer.now(), Duration::from_secs(2));
    }
}
