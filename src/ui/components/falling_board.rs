use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Widget};

use kanadrill::modes::falling::FallingGrid;

use crate::ui::layout::centered;
use crate::ui::theme::Palette;

/// Each cell is four columns wide so full-width kana fit with padding.
const CELL_WIDTH: u16 = 4;

pub struct FallingBoard<'a> {
    grid: &'a FallingGrid,
    flash: bool,
    palette: &'a Palette,
}

impl<'a> FallingBoard<'a> {
    pub fn new(grid: &'a FallingGrid, flash: bool, palette: &'a Palette) -> Self {
        Self {
            grid,
            flash,
            palette,
        }
    }
}

impl Widget for FallingBoard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        let settings = self.grid.settings();
        let width = settings.columns as u16 * CELL_WIDTH + 2;
        let height = settings.rows as u16 + 2;
        let board = centered(area, width, height);

        let border = if self.flash { p.incorrect } else { p.border };
        let block = Block::bordered()
            .title(format!(" cleared {} ", self.grid.cleared()))
            .border_style(Style::default().fg(border));
        let inner = block.inner(board);
        block.render(board, buf);

        let active = self.grid.active();
        for row in 0..settings.rows {
            let y = inner.y + row as u16;
            if y >= inner.y + inner.height {
                break;
            }
            for column in 0..settings.columns {
                let x = inner.x + column as u16 * CELL_WIDTH + 1;
                if x + 2 > inner.x + inner.width {
                    break;
                }
                let Some(glyph) = self.grid.cell(column, row) else {
                    buf.set_string(x, y, " ·", Style::default().fg(p.dim));
                    continue;
                };
                let falling = active.is_some_and(|b| b.column == column && b.row == row);
                let style = if falling {
                    Style::default().fg(p.accent).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(p.incorrect)
                };
                buf.set_string(x, y, glyph, style);
            }
        }
    }
}
