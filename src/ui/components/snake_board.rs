use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Widget};

use kanadrill::modes::snake::{Direction, SnakeMode};

use crate::ui::layout::centered;
use crate::ui::theme::Palette;

const CELL_WIDTH: u16 = 2;

pub struct SnakeBoard<'a> {
    snake: &'a SnakeMode,
    palette: &'a Palette,
}

impl<'a> SnakeBoard<'a> {
    pub fn new(snake: &'a SnakeMode, palette: &'a Palette) -> Self {
        Self { snake, palette }
    }
}

impl Widget for SnakeBoard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let p = self.palette;
        let game = self.snake.game();
        let width = game.width() as u16 * CELL_WIDTH + 2;
        let height = game.height() as u16 + 2;
        let board = centered(area, width, height);

        let block = Block::bordered()
            .title(format!(" length {} ", game.body().len()))
            .border_style(Style::default().fg(p.border));
        let inner = block.inner(board);
        block.render(board, buf);

        let place = |(x, y): (i32, i32)| -> Option<(u16, u16)> {
            let bx = inner.x + x as u16 * CELL_WIDTH;
            let by = inner.y + y as u16;
            (bx + CELL_WIDTH <= inner.x + inner.width && by < inner.y + inner.height)
                .then_some((bx, by))
        };

        if let Some(food) = game.food()
            && let Some((x, y)) = place(food)
        {
            buf.set_string(x, y, "●", Style::default().fg(p.warning));
        }
        for (i, &cell) in game.body().iter().enumerate() {
            let Some((x, y)) = place(cell) else {
                continue;
            };
            let style = if i == 0 {
                Style::default().fg(p.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(p.correct)
            };
            buf.set_string(x, y, if i == 0 { "◆" } else { "■" }, style);
        }

        // Offered kana sit on the board edge they would steer toward.
        let head = game.head();
        for (direction, character) in self.snake.offered() {
            let (x, y) = match direction {
                Direction::Up => (board.x + (head.0 as u16 * CELL_WIDTH) + 1, board.y),
                Direction::Down => (
                    board.x + (head.0 as u16 * CELL_WIDTH) + 1,
                    board.y + board.height.saturating_sub(1),
                ),
                Direction::Left => (board.x, board.y + 1 + head.1 as u16),
                Direction::Right => (
                    board.x + board.width.saturating_sub(2),
                    board.y + 1 + head.1 as u16,
                ),
            };
            if x < area.x + area.width && y < area.y + area.height {
                buf.set_string(
                    x,
                    y,
                    &character.glyph,
                    Style::default().fg(p.fg).add_modifier(Modifier::BOLD),
                );
            }
        }
    }
}
