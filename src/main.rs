mod app;
mod event;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use app::{App, AppScreen};
use event::{AppEvent, EventHandler};
use kanadrill::config::Config;
use kanadrill::modes::Mode;
use kanadrill::store::json_store::JsonStore;
use ui::theme::Palette;

#[derive(Parser)]
#[command(
    name = "kanadrill",
    version,
    about = "Terminal kana typing drill with adaptive character weighting"
)]
struct Cli {
    #[arg(short, long, help = "Game mode (classic, falling, spiral, snake)")]
    mode: Option<String>,

    #[arg(
        short,
        long,
        value_delimiter = ',',
        help = "Scripts to practice (hiragana, katakana)"
    )]
    script: Vec<String>,

    #[arg(short, long, help = "Seconds allowed per character")]
    time_limit: Option<f64>,

    #[arg(long, help = "Include dakuten and handakuten kana")]
    dakuten: bool,

    #[arg(long, help = "Include combination (yoon) kana")]
    combinations: bool,

    #[arg(long, help = "Seed for reproducible draws")]
    seed: Option<u64>,

    #[arg(long, help = "Forget saved weights, stats and history before starting")]
    reset: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging();

    let mut config = Config::load().unwrap_or_else(|e| {
        error!(error = %e, "config unreadable, using defaults");
        Config::default()
    });
    write_default_config(&config, &Config::config_path());
    let mode = apply_cli(&cli, &mut config)?;

    if cli.reset {
        JsonStore::new()?.clear()?;
        info!("stored progress cleared");
    }

    let mut app = App::new(config, mode, cli.seed)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(app.config.tick_ms));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!(error = ?err, "exited with error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn apply_cli(cli: &Cli, config: &mut Config) -> Result<Mode> {
    let mode = match &cli.mode {
        Some(key) => match Mode::from_key(key) {
            Some(mode) => mode,
            None => bail!("unknown mode '{key}' (expected classic, falling, spiral or snake)"),
        },
        None => config.mode(),
    };
    if !cli.script.is_empty() {
        config.scripts = cli.script.iter().map(|s| s.trim().to_lowercase()).collect();
    }
    if let Some(secs) = cli.time_limit {
        config.time_limit_ms = (secs * 1000.0).round().max(0.0) as u64;
    }
    config.include_dakuten |= cli.dakuten;
    config.include_combinations |= cli.combinations;
    config.validate();
    Ok(mode)
}

/// Seed a config file on first run so there is something to edit.
fn write_default_config(config: &Config, path: &Path) {
    if path.exists() {
        return;
    }
    match config.save_to(path) {
        Ok(()) => info!(path = %path.display(), "wrote default config"),
        Err(e) => warn!(error = %e, "could not write default config"),
    }
}

/// Log to a file under the data directory; stdout belongs to the TUI.
fn init_logging() -> Option<WorkerGuard> {
    let log_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kanadrill");
    std::fs::create_dir_all(&log_dir).ok()?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "kanadrill.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    let palette = Palette::default();
    loop {
        terminal.draw(|frame| ui::render(frame, app, &palette))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key)?,
            AppEvent::Tick(elapsed) => app.tick(elapsed.as_millis() as u64),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            app.finish();
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Repeats would type the same kana reading twice.
    if key.kind != KeyEventKind::Press {
        return Ok(());
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return Ok(());
    }

    match app.screen {
        AppScreen::Playing => match key.code {
            KeyCode::Esc => app.finish(),
            KeyCode::Backspace => app.backspace(),
            KeyCode::Char(ch) => app.type_char(ch),
            _ => {}
        },
        AppScreen::Summary => match key.code {
            KeyCode::Char('r') | KeyCode::Enter => app.restart()?,
            KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
            _ => {}
        },
    }
    Ok(())
}
