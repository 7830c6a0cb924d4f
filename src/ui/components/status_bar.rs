use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use kanadrill::engine::combo::ComboState;

use crate::ui::theme::Palette;

pub struct StatusBar<'a> {
    mode: &'a str,
    combo: &'a ComboState,
    best: Option<u64>,
    palette: &'a Palette,
}

impl<'a> StatusBar<'a> {
    pub fn new(
        mode: &'a str,
        combo: &'a ComboState,
        best: Option<u64>,
        palette: &'a Palette,
    ) -> Self {
        Self {
            mode,
            combo,
            best,
            palette,
        }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        let label = Style::default().fg(p.dim);
        let value = Style::default().fg(p.fg).add_modifier(Modifier::BOLD);

        let multiplier_style = if self.combo.multiplier > 1.0 {
            Style::default().fg(p.accent).add_modifier(Modifier::BOLD)
        } else {
            value
        };

        let mut spans = vec![
            Span::styled(" score ", label),
            Span::styled(self.combo.score.to_string(), value),
            Span::styled("   streak ", label),
            Span::styled(self.combo.streak.to_string(), value),
            Span::styled("   best streak ", label),
            Span::styled(self.combo.highest_streak.to_string(), value),
            Span::styled("   combo ", label),
            Span::styled(format!("x{:.1}", self.combo.multiplier), multiplier_style),
        ];
        if let Some(best) = self.best {
            spans.push(Span::styled("   high score ", label));
            spans.push(Span::styled(best.to_string(), value));
        }

        let block = Block::bordered()
            .title(format!(" kanadrill · {} ", self.mode))
            .border_style(Style::default().fg(p.border));
        Paragraph::new(Line::from(spans)).block(block).render(area, buf);
    }
}
