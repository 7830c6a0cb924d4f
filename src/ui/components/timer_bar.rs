use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Gauge, Widget};

use kanadrill::engine::timer::{CountdownTimer, TimerState};

use crate::ui::theme::Palette;

/// Countdown gauge for the per-character clock or the snake step clock.
pub struct TimerBar<'a> {
    title: &'a str,
    timer: &'a CountdownTimer,
    palette: &'a Palette,
}

impl<'a> TimerBar<'a> {
    pub fn new(title: &'a str, timer: &'a CountdownTimer, palette: &'a Palette) -> Self {
        Self {
            title,
            timer,
            palette,
        }
    }

    fn label(&self) -> String {
        match self.timer.state() {
            TimerState::Stopped => "--".to_string(),
            TimerState::Paused => "paused".to_string(),
            TimerState::Running | TimerState::Expired => {
                format!("{:.1}s", self.timer.remaining_ms() as f64 / 1000.0)
            }
        }
    }
}

impl Widget for TimerBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        let ratio = self.timer.fraction_remaining().clamp(0.0, 1.0);
        // A stopped clock keeps its last reading; grey it out.
        let fill = if self.timer.state() == TimerState::Stopped {
            p.dim
        } else {
            p.timer_color(ratio)
        };

        Gauge::default()
            .block(
                Block::bordered()
                    .title(format!(" {} ", self.title))
                    .border_style(Style::default().fg(p.border)),
            )
            .gauge_style(Style::default().fg(fill).bg(p.bar_empty))
            .ratio(ratio)
            .label(self.label())
            .use_unicode(true)
            .render(area, buf);
    }
}
