use crossterm::style::Color;

/// Colours for the status line
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub fg: Color,
    /// First beat of the bar
    pub downbeat: Color,
    /// Any other sounding beat
    pub beat: Color,
    /// Beats of the bar that are not sounding
    pub idle: Color,
    pub highlight: Color,
    pub dimmed: Color,
}

impl Theme {
    /// Default theme - uses terminal's ANSI colors
    pub fn default_theme() -> Self {
        Self {
            name: "default",
            fg: Color::Reset,
            downbeat: Color::Yellow,
            beat: Color::Green,
            idle: Color::DarkGrey,
            highlight: Color::Magenta,
            dimmed: Color::DarkGrey,
        }
    }

    /// Classic green CRT phosphor look
    pub fn phosphor_green() -> Self {
        Self {
            name: "phosphor-green",
            fg: Color::Rgb { r: 0, g: 255, b: 0 },
            downbeat: Color::Rgb { r: 180, g: 255, b: 180 },
            beat: Color::Rgb { r: 0, g: 200, b: 0 },
            idle: Color::Rgb { r: 0, g: 80, b: 0 },
            highlight: Color::Rgb { r: 150, g: 255, b: 150 },
            dimmed: Color::Rgb { r: 0, g: 60, b: 0 },
        }
    }

    /// Warm amber monochrome CRT
    pub fn amber_crt() -> Self {
        Self {
            name: "amber-crt",
            fg: Color::Rgb { r: 255, g: 176, b: 0 },
            downbeat: Color::Rgb { r: 255, g: 220, b: 150 },
            beat: Color::Rgb { r: 200, g: 140, b: 0 },
            idle: Color::Rgb { r: 80, g: 55, b: 0 },
            highlight: Color::Rgb { r: 255, g: 220, b: 150 },
            dimmed: Color::Rgb { r: 60, g: 40, b: 0 },
        }
    }

    /// Cool blue terminal tones
    pub fn blue_terminal() -> Self {
        Self {
            name: "blue-terminal",
            fg: Color::Rgb { r: 100, g: 180, b: 255 },
            downbeat: Color::Rgb { r: 180, g: 220, b: 255 },
            beat: Color::Rgb { r: 80, g: 150, b: 220 },
            idle: Color::Rgb { r: 30, g: 60, b: 100 },
            highlight: Color::Rgb { r: 180, g: 220, b: 255 },
            dimmed: Color::Rgb { r: 25, g: 50, b: 80 },
        }
    }

    /// Stark black and white high contrast
    pub fn high_contrast() -> Self {
        Self {
            name: "high-contrast",
            fg: Color::White,
            downbeat: Color::White,
            beat: Color::Grey,
            idle: Color::Rgb { r: 60, g: 60, b: 60 },
            highlight: Color::White,
            dimmed: Color::Rgb { r: 80, g: 80, b: 80 },
        }
    }

    /// Get theme by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default_theme()),
            "phosphor-green" => Some(Self::phosphor_green()),
            "amber-crt" => Some(Self::amber_crt()),
            "blue-terminal" => Some(Self::blue_terminal()),
            "high-contrast" => Some(Self::high_contrast()),
            _ => None,
        }
    }

    /// List all available theme names
    pub fn available_themes() -> &'static [&'static str] {
        &[
            "default",
            "phosphor-green",
            "amber-crt",
            "blue-terminal",
            "high-contrast",
        ]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_theme_resolves_to_itself() {
        for name in Theme::available_themes() {
            let theme = Theme::from_name(name).unwrap();
            assert_eq!(theme.name, *name);
        }
    }

    #[test]
    fn unknown_theme_is_none() {
        assert!(Theme::from_name("solarized").is_none());
        assert!(Theme::from_name("").is_none());
    }

    #[test]
    fn downbeat_stands_apart_in_every_theme() {
        for name in Theme::available_themes() {
            let theme = Theme::from_name(name).unwrap();
            assert_ne!(theme.downbeat, theme.beat, "{}", name);
            assert_ne!(theme.downbeat, theme.idle, "{}", name);
        }
    }

    #[test]
    fn default_is_the_default_theme() {
        assert_eq!(Theme::default().name, "default");
    }
}
