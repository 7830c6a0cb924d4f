pub mod components;
pub mod layout;
pub mod theme;

use ratatui::Frame;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use crate::app::{App, AppScreen, Game};
use components::falling_board::FallingBoard;
use components::prompt::Prompt;
use components::snake_board::SnakeBoard;
use components::spiral_board::SpiralBoard;
use components::status_bar::StatusBar;
use components::summary::Summary;
use components::timer_bar::TimerBar;
use layout::AppLayout;
use theme::Palette;

pub fn render(frame: &mut Frame, app: &App, palette: &Palette) {
    let area = frame.area();

    if app.screen == AppScreen::Summary
        && let Some(result) = &app.last_result
    {
        frame.render_widget(Summary::new(result, app.best_score, palette), area);
        return;
    }

    let layout = AppLayout::new(area);
    let mode = app.mode.as_str();

    match &app.game {
        Game::Classic(session) => {
            let snapshot = session.snapshot();
            frame.render_widget(
                StatusBar::new(mode, session.combo(), app.best_score, palette),
                layout.header,
            );
            frame.render_widget(TimerBar::new("time", session.timer(), palette), layout.timer);
            frame.render_widget(Prompt::new(&snapshot, &app.input, palette), layout.main);
        }
        Game::Falling { session, grid } => {
            let snapshot = session.snapshot();
            frame.render_widget(
                StatusBar::new(mode, session.combo(), app.best_score, palette),
                layout.header,
            );
            frame.render_widget(
                answer_line(&snapshot.glyph, &app.input, snapshot.reveal.as_deref(), palette),
                layout.timer,
            );
            frame.render_widget(
                FallingBoard::new(grid, snapshot.wrong_answer_flash, palette),
                layout.main,
            );
        }
        Game::Spiral { session, spiral } => {
            let snapshot = session.snapshot();
            frame.render_widget(
                StatusBar::new(mode, session.combo(), app.best_score, palette),
                layout.header,
            );
            frame.render_widget(TimerBar::new("time", session.timer(), palette), layout.timer);
            frame.render_widget(
                SpiralBoard::new(
                    spiral,
                    session.timer().fraction_remaining(),
                    snapshot.wrong_answer_flash,
                    palette,
                ),
                layout.main,
            );
        }
        Game::Snake(snake) => {
            frame.render_widget(
                StatusBar::new(mode, snake.combo(), app.best_score, palette),
                layout.header,
            );
            frame.render_widget(
                TimerBar::new("step", snake.step_timer(), palette),
                layout.timer,
            );
            frame.render_widget(SnakeBoard::new(snake, palette), layout.main);
        }
    }

    let footer = format!(" > {}_   [esc] finish   [ctrl-c] quit", app.input);
    frame.render_widget(
        Paragraph::new(Line::from(footer)).style(Style::default().fg(palette.dim)),
        layout.footer,
    );
}

fn answer_line<'a>(
    glyph: &str,
    input: &str,
    reveal: Option<&str>,
    palette: &Palette,
) -> Paragraph<'a> {
    let text = match reveal {
        Some(answer) => format!(" {glyph} = {answer}"),
        None => format!(" {glyph}  > {input}_"),
    };
    Paragraph::new(Line::from(text)).style(Style::default().fg(palette.fg))
}
