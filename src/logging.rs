use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Settings;

pub const LOG_FILE_NAME: &str = "rclone-tui.log";

/// Install the file subscriber under ~/.rclone-tui/debug.
///
/// The terminal belongs to the UI, so nothing is written to stdout or
/// stderr. Returns the guard that flushes the writer on drop, or `None`
/// when the directory cannot be created.
pub fn init_debug_log() -> Option<WorkerGuard> {
    let dir = Settings::debug_dir()?;
    match init_in(&dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: cannot create debug log in {}: {}", dir.display(), e);
            None
        }
    }
}

fn init_in(dir: &Path) -> io::Result<WorkerGuard> {
    fs::create_dir_all(dir)?;
    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_thread_names(true)
        .with_filter(env_filter);

    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(file_layer).try_init();
    Ok(guard)
}
