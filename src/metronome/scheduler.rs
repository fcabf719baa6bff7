use std::time::Duration;

use super::tempo::{Bpm, TimeSignature};
use crate::timer::{TimerHandle, TimerHost};

/// Whether the beat timer is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Running,
}

/// One beat notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatEvent {
    /// Zero-based position within the bar
    pub index: u8,
    pub signature: TimeSignature,
    /// Host time at which the event was produced
    pub at: Duration,
}

impl BeatEvent {
    pub fn is_downbeat(&self) -> bool {
        self.index == 0
    }
}

#[derive(Debug, Clone, Copy)]
enum Transport {
    Stopped,
    /// Beat `beats + 1` is due at `origin + (beats + 1) * interval`
    Running {
        origin: Duration,
        beats: u64,
        pending: TimerHandle,
    },
}

/// BPM timing - turns tempo and signature into a stream of beat events.
///
/// Every beat is scheduled against an absolute target measured from the
/// moment playback (re)started, so late timer dispatch delays single beats
/// without shifting the ones after it. Tempo changes while running re-baseline
/// the schedule: the next beat lands one new interval after the change, at
/// bar position 0.
#[derive(Debug)]
pub struct BeatScheduler {
    bpm: Bpm,
    signature: TimeSignature,
    beat_index: u8,
    transport: Transport,
}

impl BeatScheduler {
    pub fn new(bpm: Bpm, signature: TimeSignature) -> Self {
        Self {
            bpm,
            signature,
            beat_index: 0,
            transport: Transport::Stopped,
        }
    }

    pub fn bpm(&self) -> Bpm {
        self.bpm
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.signature
    }

    /// Bar position of the beat that sounds next
    pub fn beat_index(&self) -> u8 {
        self.beat_index
    }

    pub fn state(&self) -> PlaybackState {
        match self.transport {
            Transport::Stopped => PlaybackState::Stopped,
            Transport::Running { .. } => PlaybackState::Running,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Running
    }

    pub fn interval(&self) -> Duration {
        self.bpm.interval()
    }

    /// Timer the scheduler is waiting on, if running
    pub fn pending_timer(&self) -> Option<TimerHandle> {
        match self.transport {
            Transport::Stopped => None,
            Transport::Running { pending, .. } => Some(pending),
        }
    }

    /// Store a new tempo. Values outside the supported range are ignored and
    /// `false` is returned. A running schedule restarts from now.
    pub fn set_bpm(&mut self, bpm: u16, timer: &mut impl TimerHost) -> bool {
        let Some(bpm) = Bpm::new(bpm) else {
            log::debug!("ignoring out-of-range tempo {}", bpm);
            return false;
        };
        self.bpm = bpm;
        log::debug!("tempo set to {} BPM", bpm);
        if self.is_playing() {
            self.restart(timer);
        }
        true
    }

    /// Store a new signature and rewind to the start of the bar.
    ///
    /// Returns the bar-position refresh for index 0, produced whether or not
    /// the schedule is running. The pending beat timer is left alone: its
    /// interval did not change.
    pub fn set_time_signature(&mut self, signature: TimeSignature, now: Duration) -> BeatEvent {
        self.signature = signature;
        self.beat_index = 0;
        log::debug!("time signature set to {}", signature);
        BeatEvent {
            index: 0,
            signature,
            at: now,
        }
    }

    pub fn start(&mut self, timer: &mut impl TimerHost) {
        if self.is_playing() {
            return;
        }
        let origin = timer.now();
        self.beat_index = 0;
        let pending = timer.arm(self.bpm.interval());
        self.transport = Transport::Running {
            origin,
            beats: 0,
            pending,
        };
        log::debug!("started at {} BPM in {}", self.bpm, self.signature);
    }

    pub fn stop(&mut self, timer: &mut impl TimerHost) {
        if let Transport::Running { pending, .. } = self.transport {
            timer.cancel(pending);
            self.transport = Transport::Stopped;
            self.beat_index = 0;
            log::debug!("stopped");
        }
    }

    pub fn restart(&mut self, timer: &mut impl TimerHost) {
        self.stop(timer);
        self.start(timer);
    }

    /// Handle an expired timer.
    ///
    /// Returns the beat that just sounded and arms the next one. Handles other
    /// than the pending beat timer produce nothing.
    pub fn tick(&mut self, handle: TimerHandle, timer: &mut impl TimerHost) -> Option<BeatEvent> {
        let Transport::Running {
            origin,
            beats,
            pending,
        } = self.transport
        else {
            return None;
        };
        if pending != handle {
            return None;
        }

        let now = timer.now();
        let event = BeatEvent {
            index: self.beat_index,
            signature: self.signature,
            at: now,
        };
        log::trace!("beat {} of {}", event.index, self.signature);

        self.beat_index = (self.beat_index + 1) % self.signature.numerator();
        let beats = beats + 1;

        // A fire later than a whole interval yields a zero delay, so missed
        // beats still sound in order instead of being merged.
        let target = origin + self.bpm.beat_offset(beats + 1);
        let pending = timer.arm(target.saturating_sub(now));
        self.transport = Transport::Running {
            origin,
            beats,
            pending,
        };
        Some(event)
    }
}

impl Default for BeatScheduler {
    fn default() -> Self {
        Self::new(Bpm::default(), TimeSignature::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTimer;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn run_until(
        scheduler: &mut BeatScheduler,
        timer: &mut ManualTimer,
        until: Duration,
    ) -> Vec<BeatEvent> {
        let mut events = Vec::new();
        while let Some(handle) = timer.next_fire(until) {
            events.extend(scheduler.tick(handle, timer));
        }
        timer.set_now(until);
        events
    }

    #[test]
    fn first_beat_sounds_one_interval_after_start() {
        let mut timer = ManualTimer::new();
        let mut scheduler = BeatScheduler::default();
        scheduler.start(&mut timer);
        assert!(run_until(&mut scheduler, &mut timer, ms(499)).is_empty());
        let events = run_until(&mut scheduler, &mut timer, ms(500));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].index, 0);
        assert_eq!(events[0].at, ms(500));
    }

    #[test]
    fn beat_index_wraps_at_numerator() {
        let mut timer = ManualTimer::new();
        let mut scheduler = BeatScheduler::new(Bpm::new(120).unwrap(), TimeSignature::new(3, 4).unwrap());
        scheduler.start(&mut timer);
        let events = run_until(&mut scheduler, &mut timer, ms(3500));
        let indices: Vec<u8> = events.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn start_while_running_arms_nothing_new() {
        let mut timer = ManualTimer::new();
        let mut scheduler = BeatScheduler::default();
        scheduler.start(&mut timer);
        let pending = scheduler.pending_timer();
        scheduler.start(&mut timer);
        assert_eq!(scheduler.pending_timer(), pending);
        assert_eq!(timer.pending(), 1);
    }

    #[test]
    fn stop_cancels_pending_beat() {
        let mut timer = ManualTimer::new();
        let mut scheduler = BeatScheduler::default();
        scheduler.start(&mut timer);
        run_until(&mut scheduler, &mut timer, ms(1200));
        scheduler.stop(&mut timer);
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
        assert_eq!(scheduler.beat_index(), 0);
        assert_eq!(timer.pending(), 0);
        assert!(run_until(&mut scheduler, &mut timer, ms(60_000)).is_empty());
    }

    #[test]
    fn stale_handle_produces_no_beat() {
        let mut timer = ManualTimer::new();
        let mut scheduler = BeatScheduler::default();
        scheduler.start(&mut timer);
        let stale = scheduler.pending_timer().unwrap();
        scheduler.restart(&mut timer);
        assert_eq!(scheduler.tick(stale, &mut timer), None);
    }

    #[test]
    fn out_of_range_tempo_is_ignored() {
        let mut timer = ManualTimer::new();
        let mut scheduler = BeatScheduler::default();
        assert!(!scheduler.set_bpm(29, &mut timer));
        assert!(!scheduler.set_bpm(301, &mut timer));
        assert_eq!(scheduler.bpm().get(), 120);
        assert!(scheduler.set_bpm(30, &mut timer));
        assert_eq!(scheduler.bpm().get(), 30);
    }

    #[test]
    fn tempo_change_while_running_resets_phase() {
        let mut timer = ManualTimer::new();
        let mut scheduler = BeatScheduler::default();
        scheduler.start(&mut timer);
        run_until(&mut scheduler, &mut timer, ms(700));
        scheduler.set_bpm(60, &mut timer);
        assert!(run_until(&mut scheduler, &mut timer, ms(1699)).is_empty());
        let events = run_until(&mut scheduler, &mut timer, ms(1700));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].index, 0);
    }

    #[test]
    fn signature_change_rewinds_without_rearming() {
        let mut timer = ManualTimer::new();
        let mut scheduler = BeatScheduler::default();
        scheduler.start(&mut timer);
        run_until(&mut scheduler, &mut timer, ms(1000));
        let pending = scheduler.pending_timer();
        let refresh = scheduler.set_time_signature(TimeSignature::new(6, 8).unwrap(), timer.now());
        assert_eq!(refresh.index, 0);
        assert_eq!(scheduler.beat_index(), 0);
        assert_eq!(scheduler.pending_timer(), pending);
        let events = run_until(&mut scheduler, &mut timer, ms(1500));
        assert_eq!(events[0].index, 0);
        assert_eq!(events[0].signature.numerator(), 6);
    }

    #[test]
    fn late_dispatch_does_not_accumulate_drift() {
        let mut timer = ManualTimer::with_latency(ms(3));
        let mut scheduler = BeatScheduler::default();
        scheduler.start(&mut timer);
        let events = run_until(&mut scheduler, &mut timer, ms(50_010));
        assert_eq!(events.len(), 100);
        // Each beat is 3 ms late, never more.
        assert_eq!(events[99].at, ms(50_003));
    }

    #[test]
    fn stalled_host_catches_up_beat_by_beat() {
        let mut timer = ManualTimer::new();
        let mut scheduler = BeatScheduler::default();
        scheduler.start(&mut timer);
        // Host asleep until 1600 ms: beats due at 500, 1000 and 1500 are overdue.
        timer.set_now(ms(1600));
        let events = run_until(&mut scheduler, &mut timer, ms(1600));
        let indices: Vec<u8> = events.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
