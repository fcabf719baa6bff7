use std::time::{Duration, Instant};

use super::{TimerHandle, TimerHost, TimerQueue};

/// Wall-clock host for an event loop.
///
/// Nothing fires on its own: the loop sleeps until `next_deadline`, then
/// drains `pop_due` and hands each handle to the engine.
#[derive(Debug)]
pub struct SystemTimer {
    epoch: Instant,
    queue: TimerQueue,
}

impl SystemTimer {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            queue: TimerQueue::new(),
        }
    }

    /// Instant at which the earliest armed timer expires
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.queue.next_deadline().map(|offset| self.epoch + offset)
    }

    /// Next expired timer, if any
    pub fn pop_due(&mut self) -> Option<TimerHandle> {
        let now = self.now();
        self.queue.pop_due(now)
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerHost for SystemTimer {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn arm(&mut self, delay: Duration) -> TimerHandle {
        let deadline = self.now() + delay;
        self.queue.schedule(deadline)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.queue.cancel(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delay_is_due_immediately() {
        let mut timer = SystemTimer::new();
        let handle = timer.arm(Duration::ZERO);
        assert!(timer.next_deadline().is_some());
        assert_eq!(timer.pop_due(), Some(handle));
        assert_eq!(timer.pop_due(), None);
    }

    #[test]
    fn canceled_timer_leaves_no_deadline() {
        let mut timer = SystemTimer::new();
        let handle = timer.arm(Duration::from_secs(60));
        timer.cancel(handle);
        assert_eq!(timer.next_deadline(), None);
    }
}
