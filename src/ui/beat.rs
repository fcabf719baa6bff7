use std::io::{self, Write};

use beatkeeper::{BeatEvent, Bpm, TimeSignature};
use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{Clear, ClearType};

use super::Theme;

/// How one beat of the bar is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarCell {
    Downbeat,
    Beat,
    Idle,
}

impl BarCell {
    fn glyph(self) -> &'static str {
        match self {
            BarCell::Downbeat => "(X)",
            BarCell::Beat => " X ",
            BarCell::Idle => " . ",
        }
    }
}

/// One cell per beat of the bar, with the sounding beat lit
pub fn bar_cells(signature: TimeSignature, sounding: Option<u8>) -> Vec<BarCell> {
    (0..signature.numerator())
        .map(|i| match sounding {
            Some(0) if i == 0 => BarCell::Downbeat,
            Some(beat) if beat == i => BarCell::Beat,
            _ => BarCell::Idle,
        })
        .collect()
}

/// Everything the status line shows
pub struct StatusInfo<'a> {
    pub playing: bool,
    pub bpm: Bpm,
    pub signature: TimeSignature,
    pub last_beat: Option<BeatEvent>,
    pub taps: usize,
    pub message: Option<&'a str>,
}

/// Redraw the single status line in place
pub fn render_status(out: &mut impl Write, info: &StatusInfo<'_>, theme: &Theme) -> io::Result<()> {
    let status = if info.playing { "PLAY" } else { "STOP" };
    let status_color = if info.playing { theme.highlight } else { theme.dimmed };

    queue!(
        out,
        MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        PrintStyledContent(format!(" {} ", status).with(status_color).bold()),
        PrintStyledContent(" | ".with(theme.dimmed)),
    )?;

    // A signature refresh resets the bar without sounding, so only light a
    // cell while playing.
    let sounding = info
        .last_beat
        .filter(|beat| info.playing && beat.signature == info.signature)
        .map(|beat| beat.index);
    for cell in bar_cells(info.signature, sounding) {
        let color = match cell {
            BarCell::Downbeat => theme.downbeat,
            BarCell::Beat => theme.beat,
            BarCell::Idle => theme.idle,
        };
        queue!(out, PrintStyledContent(cell.glyph().with(color)))?;
    }

    queue!(
        out,
        PrintStyledContent(" | ".with(theme.dimmed)),
        PrintStyledContent(format!("BPM: {}", info.bpm).with(theme.fg)),
        PrintStyledContent(" | ".with(theme.dimmed)),
        PrintStyledContent(info.signature.to_string().with(theme.fg)),
    )?;
    if info.taps > 0 {
        queue!(
            out,
            PrintStyledContent(format!(" | taps: {}", info.taps).with(theme.dimmed))
        )?;
    }
    if let Some(message) = info.message {
        queue!(out, Print("  "), PrintStyledContent(message.with(theme.highlight)))?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(numerator: u8, denominator: u8) -> TimeSignature {
        TimeSignature::new(numerator, denominator).unwrap()
    }

    #[test]
    fn downbeat_is_accented() {
        assert_eq!(
            bar_cells(sig(3, 4), Some(0)),
            vec![BarCell::Downbeat, BarCell::Idle, BarCell::Idle]
        );
    }

    #[test]
    fn other_beats_are_lit_plainly() {
        assert_eq!(
            bar_cells(sig(4, 4), Some(2)),
            vec![BarCell::Idle, BarCell::Idle, BarCell::Beat, BarCell::Idle]
        );
    }

    #[test]
    fn nothing_lit_when_silent() {
        assert!(bar_cells(sig(7, 8), None)
            .iter()
            .all(|cell| *cell == BarCell::Idle));
    }

    #[test]
    fn status_line_names_tempo_and_signature() {
        let mut out = Vec::new();
        let info = StatusInfo {
            playing: false,
            bpm: Bpm::default(),
            signature: sig(6, 8),
            last_beat: None,
            taps: 2,
            message: None,
        };
        render_status(&mut out, &info, &Theme::high_contrast()).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("STOP"));
        assert!(text.contains("BPM: 120"));
        assert!(text.contains("6/8"));
        assert!(text.contains("taps: 2"));
    }
}
