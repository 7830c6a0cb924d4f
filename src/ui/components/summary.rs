use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use kanadrill::session::result::SessionResult;

use crate::ui::layout::centered;
use crate::ui::theme::Palette;

pub struct Summary<'a> {
    result: &'a SessionResult,
    best: Option<u64>,
    palette: &'a Palette,
}

impl<'a> Summary<'a> {
    pub fn new(result: &'a SessionResult, best: Option<u64>, palette: &'a Palette) -> Self {
        Self {
            result,
            best,
            palette,
        }
    }
}

impl Widget for Summary<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        let r = self.result;
        let label = Style::default().fg(p.dim);
        let value = Style::default().fg(p.fg).add_modifier(Modifier::BOLD);
        let row = |name: &str, v: String| {
            Line::from(vec![Span::styled(format!("{name:>14}  "), label), Span::styled(v, value)])
        };

        let mut lines = vec![
            Line::from(""),
            row("score", r.score.to_string()),
            row("best streak", r.highest_streak.to_string()),
            row("correct", r.correct.to_string()),
            row("incorrect", r.incorrect.to_string()),
            row("timeouts", r.timeouts.to_string()),
            row("accuracy", format!("{:.1}%", r.accuracy)),
            row("per minute", format!("{:.1}", r.per_minute())),
        ];
        if let Some(best) = self.best {
            lines.push(row("high score", best.to_string()));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("[r] play again   [q] quit", label)));

        let block = Block::bordered()
            .title(format!(" {} finished ", r.mode))
            .border_style(Style::default().fg(p.accent));
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block)
            .render(centered(area, 44, 16), buf);
    }
}
