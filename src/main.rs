mod config;
mod error;
mod keybindings;
mod logging;
mod services;
mod ui;
mod utils;

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::config::{Args, Settings};
use crate::services::size_cache::SizeTracker;
use crate::services::transfer::TransferRunner;
use crate::ui::app::App;

fn main() -> ExitCode {
    let args = Args::parse();
    let settings = Settings::from_args(&args);

    let _log_guard = if settings.debug {
        logging::init_debug_log()
    } else {
        None
    };
    tracing::info!(
        "starting: source={} dest={} tool={} workers={}",
        settings.source.display(),
        settings.destination.display(),
        settings.tool,
        settings.size_workers
    );

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("terminal error: {}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> io::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(err);
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Create app state
    let runner = TransferRunner::new(settings.tool.clone(), settings.log_file.clone());
    let sizes = SizeTracker::new(settings.size_workers);
    let mut app = App::new(settings.source.clone(), settings.destination.clone(), runner, sizes);

    // Run app
    let result = run_app(&mut terminal, &mut app);
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;

    result
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| ui::draw::draw(f, app))?;

        // Faster refresh while sizes or a transfer are still coming in
        let poll_timeout = if app.is_busy() {
            Duration::from_millis(100)
        } else {
            Duration::from_millis(250)
        };

        if event::poll(poll_timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(action) = app.keybindings.lookup(key.code, key.modifiers) {
                    if app.dispatch(action) {
                        tracing::info!("quit requested");
                        return Ok(());
                    }
                }
            }
        }
    }
}
