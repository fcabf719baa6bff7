use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;

use super::TimerHandle;

/// Deadline-ordered set of armed timers.
///
/// Timers sharing a deadline expire in the order they were armed. Canceled
/// entries stay in the heap until they reach the top and are then dropped
/// without ever being reported.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<(Duration, TimerHandle)>>,
    live: HashSet<TimerHandle>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse((deadline, handle)));
        self.live.insert(handle);
        handle
    }

    pub fn cancel(&mut self, handle: TimerHandle) {
        self.live.remove(&handle);
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.live.contains(&handle)
    }

    /// Earliest deadline that is still armed
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.discard_canceled();
        self.heap.peek().map(|Reverse((deadline, _))| *deadline)
    }

    /// Remove and return the earliest timer whose deadline is not after `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<TimerHandle> {
        if self.next_deadline()? > now {
            return None;
        }
        let Reverse((_, handle)) = self.heap.pop()?;
        self.live.remove(&handle);
        Some(handle)
    }

    /// Number of armed timers
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn discard_canceled(&mut self) {
        while let Some(&Reverse((_, handle))) = self.heap.peek() {
            if self.live.contains(&handle) {
                break;
            }
            self.heap.pop();
        }
    }
}
