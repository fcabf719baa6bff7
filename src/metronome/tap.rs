use std::collections::VecDeque;
use std::time::Duration;

use super::tempo::{Bpm, MAX_BPM, MIN_BPM};

/// Number of most recent taps averaged together
pub const TAP_CAPACITY: usize = 5;

/// Quiet period after which tap history is forgotten
pub const TAP_IDLE_RESET: Duration = Duration::from_millis(3000);

/// Estimates tempo from the spacing of user taps.
///
/// Keeps the last few tap timestamps and averages the gaps between them.
/// Estimates outside the supported tempo range are dropped rather than
/// clamped, so one stray tap cannot drag the tempo to a bound.
#[derive(Debug, Default)]
pub struct TapTempoEstimator {
    taps: VecDeque<Duration>,
}

impl TapTempoEstimator {
    pub fn new() -> Self {
        Self {
            taps: VecDeque::with_capacity(TAP_CAPACITY),
        }
    }

    /// Record a tap at `now` and return the tempo it implies, if any
    pub fn register_tap(&mut self, now: Duration) -> Option<Bpm> {
        self.taps.push_back(now);
        while self.taps.len() > TAP_CAPACITY {
            self.taps.pop_front();
        }
        self.estimate()
    }

    /// Forget the history once the idle window has passed since the newest tap
    pub fn expire(&mut self, now: Duration) {
        let idle = match self.taps.back() {
            Some(last) => now.saturating_sub(*last) >= TAP_IDLE_RESET,
            None => false,
        };
        if idle {
            log::debug!("tap history expired after {} taps", self.taps.len());
            self.taps.clear();
        }
    }

    pub fn tap_count(&self) -> usize {
        self.taps.len()
    }

    pub fn clear(&mut self) {
        self.taps.clear();
    }

    fn estimate(&self) -> Option<Bpm> {
        let (first, last) = (self.taps.front()?, self.taps.back()?);
        let gaps = self.taps.len().checked_sub(1).filter(|&n| n > 0)?;

        // The consecutive intervals telescope to last - first. A span that is
        // zero or runs backwards stands for an unbounded tempo: reject it here
        // instead of dividing by it.
        let span = last.checked_sub(*first).filter(|span| !span.is_zero())?;

        let mean_ms = span.as_secs_f64() * 1000.0 / gaps as f64;
        let bpm = (60_000.0 / mean_ms).round();
        if bpm < f64::from(MIN_BPM) || bpm > f64::from(MAX_BPM) {
            log::debug!("discarding tap estimate of {} BPM", bpm);
            return None;
        }
        Bpm::new(bpm as u16)
    }
}
