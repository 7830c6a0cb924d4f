use ratatui::style::Color;

/// Fixed terminal palette.
#[derive(Clone, Debug)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub dim: Color,
    pub accent: Color,
    pub border: Color,
    pub correct: Color,
    pub incorrect: Color,
    pub incorrect_bg: Color,
    pub warning: Color,
    pub bar_filled: Color,
    pub bar_empty: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            fg: Color::Rgb(0xcd, 0xd6, 0xf4),
            bg: Color::Rgb(0x1e, 0x1e, 0x2e),
            dim: Color::Rgb(0x58, 0x5b, 0x70),
            accent: Color::Rgb(0x89, 0xb4, 0xfa),
            border: Color::Rgb(0x45, 0x47, 0x5a),
            correct: Color::Rgb(0xa6, 0xe3, 0xa1),
            incorrect: Color::Rgb(0xf3, 0x8b, 0xa8),
            incorrect_bg: Color::Rgb(0x45, 0x27, 0x3a),
            warning: Color::Rgb(0xf9, 0xe2, 0xaf),
            bar_filled: Color::Rgb(0x89, 0xb4, 0xfa),
            bar_empty: Color::Rgb(0x31, 0x32, 0x44),
        }
    }
}

impl Palette {
    /// Timer bar color shifts as time runs out.
    pub fn timer_color(&self, fraction: f64) -> Color {
        if fraction > 0.5 {
            self.bar_filled
        } else if fraction > 0.2 {
            self.warning
        } else {
            self.incorrect
        }
    }
}
