//! Beat-scheduling engine for a personal metronome.
//!
//! ```text
//!   [ UI / key thread ] --(Command)--> [ MetronomeEngine ] --(BeatEvent)--> [ listener ]
//!                                        |            A
//!                               arm/cancel            | fire(handle)
//!                                        V            |
//!                                      [ TimerHost (ManualTimer | SystemTimer) ]
//! ```
//!
//! The engine is single threaded and does no I/O. Tempo and signature are
//! saved by the host through [`settings`].

pub mod command;
pub mod engine;
pub mod event;
pub mod metronome;
pub mod settings;
pub mod timer;

pub use engine::{BeatListener, MetronomeEngine};
pub use metronome::{BeatEvent, Bpm, PlaybackState, TimeSignature};
pub use timer::{ManualTimer, SystemTimer, TimerHandle, TimerHost};
