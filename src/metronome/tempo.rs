use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const MIN_BPM: u16 = 30;
pub const MAX_BPM: u16 = 300;
pub const DEFAULT_BPM: u16 = 120;

const NANOS_PER_MINUTE: u128 = 60_000_000_000;

/// Tempo in beats per minute, always within `MIN_BPM..=MAX_BPM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u16")]
pub struct Bpm(u16);

impl Bpm {
    pub const MIN: Bpm = Bpm(MIN_BPM);
    pub const MAX: Bpm = Bpm(MAX_BPM);

    /// Returns `None` for values outside the supported range
    pub fn new(bpm: u16) -> Option<Self> {
        (MIN_BPM..=MAX_BPM).contains(&bpm).then_some(Self(bpm))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// Time between two consecutive beats
    pub fn interval(self) -> Duration {
        self.beat_offset(1)
    }

    /// Offset of beat `n` from the start of a schedule.
    ///
    /// Computed from the beat count rather than by summing intervals, so a
    /// tempo that does not divide a minute evenly never accumulates rounding.
    pub fn beat_offset(self, n: u64) -> Duration {
        let nanos = NANOS_PER_MINUTE * u128::from(n) / u128::from(self.0);
        Duration::new(
            (nanos / 1_000_000_000) as u64,
            (nanos % 1_000_000_000) as u32,
        )
    }

    /// Step the tempo by `delta`, clamping into range
    pub fn nudged(self, delta: i32) -> Self {
        let stepped = (i32::from(self.0) + delta).clamp(i32::from(MIN_BPM), i32::from(MAX_BPM));
        Self(stepped as u16)
    }
}

impl Default for Bpm {
    fn default() -> Self {
        Self(DEFAULT_BPM)
    }
}

impl From<Bpm> for u16 {
    fn from(bpm: Bpm) -> Self {
        bpm.0
    }
}

impl TryFrom<u16> for Bpm {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Bpm::new(value)
            .ok_or_else(|| format!("tempo {} outside {}..={}", value, MIN_BPM, MAX_BPM))
    }
}

impl<'de> Deserialize<'de> for Bpm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u16::deserialize(deserializer)?;
        Bpm::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Bpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Deserialize)]
struct RawTimeSignature {
    numerator: u8,
    denominator: u8,
}

/// Beats per bar over note value per beat.
///
/// Only the numerator drives scheduling. The denominator is carried through
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSignature")]
pub struct TimeSignature {
    numerator: u8,
    denominator: u8,
}

impl TimeSignature {
    /// Signatures offered by the picker, in display order
    pub const COMMON: [TimeSignature; 11] = [
        TimeSignature::of(1, 4),
        TimeSignature::of(2, 4),
        TimeSignature::of(3, 4),
        TimeSignature::of(4, 4),
        TimeSignature::of(5, 4),
        TimeSignature::of(7, 4),
        TimeSignature::of(5, 8),
        TimeSignature::of(6, 8),
        TimeSignature::of(7, 8),
        TimeSignature::of(9, 8),
        TimeSignature::of(12, 8),
    ];

    const fn of(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Returns `None` when the bar would have no beats
    pub fn new(numerator: u8, denominator: u8) -> Option<Self> {
        (numerator >= 1).then_some(Self::of(numerator, denominator))
    }

    pub fn numerator(self) -> u8 {
        self.numerator
    }

    pub fn denominator(self) -> u8 {
        self.denominator
    }

    /// Next entry of `COMMON`, wrapping around. Signatures outside the list
    /// jump to its first entry.
    pub fn next_common(self) -> Self {
        match Self::COMMON.iter().position(|s| *s == self) {
            Some(i) => Self::COMMON[(i + 1) % Self::COMMON.len()],
            None => Self::COMMON[0],
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::of(4, 4)
    }
}

impl TryFrom<RawTimeSignature> for TimeSignature {
    type Error = String;

    fn try_from(raw: RawTimeSignature) -> Result<Self, Self::Error> {
        TimeSignature::new(raw.numerator, raw.denominator)
            .ok_or_else(|| "time signature numerator must be at least 1".to_string())
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (numerator, denominator) = s
            .split_once('/')
            .ok_or_else(|| format!("expected <beats>/<note>, got '{}'", s))?;
        let numerator: u8 = numerator
            .trim()
            .parse()
            .map_err(|e| format!("bad numerator '{}': {}", numerator, e))?;
        let denominator: u8 = denominator
            .trim()
            .parse()
            .map_err(|e| format!("bad denominator '{}': {}", denominator, e))?;
        TimeSignature::new(numerator, denominator)
            .ok_or_else(|| "time signature numerator must be at least 1".to_string())
    }
}
