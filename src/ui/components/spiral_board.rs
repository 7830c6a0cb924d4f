use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Widget};

use kanadrill::modes::spiral::Spiral;

use crate::ui::theme::Palette;

pub struct SpiralBoard<'a> {
    spiral: &'a Spiral,
    time_fraction: f64,
    flash: bool,
    palette: &'a Palette,
}

impl<'a> SpiralBoard<'a> {
    pub fn new(spiral: &'a Spiral, time_fraction: f64, flash: bool, palette: &'a Palette) -> Self {
        Self {
            spiral,
            time_fraction,
            flash,
            palette,
        }
    }
}

impl Widget for SpiralBoard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        let block = Block::bordered().border_style(Style::default().fg(p.border));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width < 4 || inner.height < 3 {
            return;
        }

        let cx = inner.x as f64 + inner.width as f64 / 2.0;
        let cy = inner.y as f64 + inner.height as f64 / 2.0;
        // Terminal cells are roughly twice as tall as wide.
        let rx = (inner.width as f64 / 2.0 - 2.0).max(1.0);
        let ry = (inner.height as f64 / 2.0 - 1.0).max(1.0);

        buf.set_string(cx as u16, cy as u16, "+", Style::default().fg(p.dim));

        // Draw outermost first so the head wins any overlap.
        for (i, item) in self.spiral.layout(self.time_fraction).iter().enumerate().rev() {
            let x = cx + item.distance * rx * item.angle.cos() - 1.0;
            let y = cy + item.distance * ry * item.angle.sin();
            let (x, y) = (x.max(inner.x as f64) as u16, y.max(inner.y as f64) as u16);
            if x + 2 > inner.x + inner.width || y >= inner.y + inner.height {
                continue;
            }
            let style = match (i, self.flash) {
                (0, true) => Style::default().fg(p.incorrect).bg(p.incorrect_bg),
                (0, false) => Style::default().fg(p.accent).add_modifier(Modifier::BOLD),
                _ => Style::default().fg(p.fg),
            };
            buf.set_string(x, y, &item.glyph, style);
        }
    }
}
