use std::time::Duration;

use crate::command::Command;
use crate::metronome::{
    BeatEvent, BeatScheduler, Bpm, PlaybackState, TapTempoEstimator, TimeSignature,
    TAP_IDLE_RESET,
};
use crate::timer::{ManualTimer, TimerHandle, TimerHost};

/// Receives beat notifications. Called synchronously from `fire`, so it must
/// return quickly.
pub type BeatListener = Box<dyn FnMut(&BeatEvent)>;

/// Metronome façade driven by the host UI.
///
/// Owns the beat scheduler, the tap estimator and the timer host they share.
/// The host reports expired timers through [`MetronomeEngine::fire`]. At most
/// one beat listener is registered at a time; registering another replaces it.
/// The engine performs no I/O: persisting tempo or signature is up to the
/// caller.
pub struct MetronomeEngine<T: TimerHost> {
    timer: T,
    scheduler: BeatScheduler,
    taps: TapTempoEstimator,
    tap_expiry: Option<TimerHandle>,
    listener: Option<BeatListener>,
}

impl<T: TimerHost> MetronomeEngine<T> {
    /// Engine at 120 BPM in 4/4, stopped
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            scheduler: BeatScheduler::default(),
            taps: TapTempoEstimator::new(),
            tap_expiry: None,
            listener: None,
        }
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn bpm(&self) -> Bpm {
        self.scheduler.bpm()
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.scheduler.time_signature()
    }

    pub fn beat_index(&self) -> u8 {
        self.scheduler.beat_index()
    }

    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    pub fn beat_interval(&self) -> Duration {
        self.scheduler.interval()
    }

    pub fn tap_count(&self) -> usize {
        self.taps.tap_count()
    }

    /// Register the beat listener, replacing any previous one
    pub fn set_listener(&mut self, listener: impl FnMut(&BeatEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Set the tempo. Out-of-range values are ignored.
    pub fn set_bpm(&mut self, bpm: u16) -> bool {
        self.scheduler.set_bpm(bpm, &mut self.timer)
    }

    /// Step the tempo, clamping at the supported bounds
    pub fn nudge_bpm(&mut self, delta: i16) {
        let bpm = self.bpm().nudged(i32::from(delta));
        self.set_bpm(bpm.get());
    }

    /// Set the time signature and notify the listener of bar position 0.
    /// A zero numerator is ignored.
    pub fn set_time_signature(&mut self, numerator: u8, denominator: u8) -> bool {
        match TimeSignature::new(numerator, denominator) {
            Some(signature) => {
                self.apply_signature(signature);
                true
            }
            None => {
                log::debug!("ignoring time signature {}/{}", numerator, denominator);
                false
            }
        }
    }

    /// Switch to the next signature of `TimeSignature::COMMON`
    pub fn cycle_time_signature(&mut self) {
        let next = self.time_signature().next_common();
        self.apply_signature(next);
    }

    pub fn start(&mut self) {
        self.scheduler.start(&mut self.timer);
    }

    pub fn stop(&mut self) {
        self.scheduler.stop(&mut self.timer);
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Feed a tap at the host's current time.
    ///
    /// Returns the estimate that was applied, if the taps so far produced one
    /// inside the supported range.
    pub fn register_tap(&mut self) -> Option<Bpm> {
        let now = self.timer.now();
        let estimate = self.taps.register_tap(now);

        if let Some(expiry) = self.tap_expiry.take() {
            self.timer.cancel(expiry);
        }
        self.tap_expiry = Some(self.timer.arm(TAP_IDLE_RESET));

        if let Some(bpm) = estimate {
            log::debug!("tap tempo {} BPM from {} taps", bpm, self.taps.tap_count());
            self.set_bpm(bpm.get());
        }
        estimate
    }

    /// Handle a timer the host reports as expired. Handles the engine no
    /// longer owns are ignored.
    pub fn fire(&mut self, handle: TimerHandle) {
        if self.tap_expiry == Some(handle) {
            self.tap_expiry = None;
            let now = self.timer.now();
            self.taps.expire(now);
            return;
        }
        if let Some(event) = self.scheduler.tick(handle, &mut self.timer) {
            self.notify(&event);
        }
    }

    /// Dispatch a UI command
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Stop => self.stop(),
            Command::Toggle => self.toggle(),
            Command::SetBpm(bpm) => {
                self.set_bpm(bpm);
            }
            Command::NudgeBpm(delta) => self.nudge_bpm(delta),
            Command::Tap => {
                self.register_tap();
            }
            Command::SetTimeSignature {
                numerator,
                denominator,
            } => {
                self.set_time_signature(numerator, denominator);
            }
            Command::CycleTimeSignature => self.cycle_time_signature(),
        }
    }

    fn apply_signature(&mut self, signature: TimeSignature) {
        let now = self.timer.now();
        let refresh = self.scheduler.set_time_signature(signature, now);
        self.notify(&refresh);
    }

    fn notify(&mut self, event: &BeatEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
    }
}

impl MetronomeEngine<ManualTimer> {
    /// Move simulated time forward by `by`, firing every timer due on the way
    pub fn advance(&mut self, by: Duration) {
        let until = self.timer.now() + by;
        while let Some(handle) = self.timer.next_fire(until) {
            self.fire(handle);
        }
        self.timer.set_now(until);
    }
}

impl<T: TimerHost> Drop for MetronomeEngine<T> {
    fn drop(&mut self) {
        self.scheduler.stop(&mut self.timer);
        if let Some(expiry) = self.tap_expiry.take() {
            self.timer.cancel(expiry);
        }
    }
}
