use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandSource {
    Keyboard,
    CommandLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    // Transport
    Start,
    Stop,
    Toggle,

    // Tempo
    SetBpm(u16),
    NudgeBpm(i16),
    Tap,

    // Bar
    SetTimeSignature { numerator: u8, denominator: u8 },
    CycleTimeSignature,
}

impl Command {
    /// Human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            Command::Start => "Start".to_string(),
            Command::Stop => "Stop".to_string(),
            Command::Toggle => "Toggle playback".to_string(),
            Command::SetBpm(bpm) => format!("Set BPM to {}", bpm),
            Command::NudgeBpm(delta) => format!("Nudge BPM by {:+}", delta),
            Command::Tap => "Tap".to_string(),
            Command::SetTimeSignature {
                numerator,
                denominator,
            } => format!("Set time signature to {}/{}", numerator, denominator),
            Command::CycleTimeSignature => "Next time signature".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptions_name_their_arguments() {
        assert_eq!(Command::SetBpm(96).description(), "Set BPM to 96");
        assert_eq!(Command::NudgeBpm(-10).description(), "Nudge BPM by -10");
        assert_eq!(
            Command::SetTimeSignature {
                numerator: 7,
                denominator: 8
            }
            .description(),
            "Set time signature to 7/8"
        );
    }
}
