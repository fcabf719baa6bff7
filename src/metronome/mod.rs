pub mod scheduler;
pub mod tap;
pub mod tempo;

pub use scheduler::{BeatEvent, BeatScheduler, PlaybackState};
pub use tap::{TapTempoEstimator, TAP_CAPACITY, TAP_IDLE_RESET};
pub use tempo::{Bpm, TimeSignature, DEFAULT_BPM, MAX_BPM, MIN_BPM};
