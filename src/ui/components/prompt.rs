use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use kanadrill::session::quiz::SessionSnapshot;

use crate::ui::theme::Palette;

/// Classic single-character prompt with the answer field under it.
pub struct Prompt<'a> {
    snapshot: &'a SessionSnapshot,
    input: &'a str,
    palette: &'a Palette,
}

impl<'a> Prompt<'a> {
    pub fn new(snapshot: &'a SessionSnapshot, input: &'a str, palette: &'a Palette) -> Self {
        Self {
            snapshot,
            input,
            palette,
        }
    }
}

impl Widget for Prompt<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        let s = self.snapshot;

        let glyph_style = if s.wrong_answer_flash {
            Style::default()
                .fg(p.incorrect)
                .bg(p.incorrect_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(p.fg).add_modifier(Modifier::BOLD)
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(format!(" {} ", s.glyph), glyph_style)),
            Line::from(""),
            Line::from(vec![
                Span::styled("> ", Style::default().fg(p.dim)),
                Span::styled(self.input.to_string(), Style::default().fg(p.accent)),
                Span::styled("_", Style::default().fg(p.dim)),
            ]),
            Line::from(""),
        ];

        if s.paused {
            lines.push(Line::from(Span::styled(
                "paused · type anything to continue",
                Style::default().fg(p.warning),
            )));
        } else if let Some(reveal) = &s.reveal {
            lines.push(Line::from(vec![
                Span::styled(format!("{} = ", s.glyph), Style::default().fg(p.dim)),
                Span::styled(reveal.clone(), Style::default().fg(p.correct)),
            ]));
        }

        if !s.upcoming.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("next: {}", s.upcoming.join(" ")),
                Style::default().fg(p.dim),
            )));
        }

        let block = Block::bordered().border_style(Style::default().fg(p.border));
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block)
            .render(area, buf);
    }
}
