use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_PREFIX: &str = "vector_client";

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("log directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("a global subscriber is already installed: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Maps a level name to a filter. Unknown names fall back to `INFO`.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

/// Sets up console and file logging for the vector client.
///
/// `RUST_LOG` wins over `log_level` when it is set. The file is
/// `<log_dir>/vector_client_<timestamp>.log`; every other `.log` file in
/// `log_dir` is removed first. Keep the returned guard alive until exit or
/// buffered lines are lost.
pub fn setup_logging(log_dir: &Path, log_level: &str) -> Result<WorkerGuard, LoggerError> {
    let io_err = |source| LoggerError::Io {
        path: log_dir.to_path_buf(),
        source,
    };
    fs::create_dir_all(log_dir).map_err(io_err)?;

    let file_name = log_file_name(&chrono::Local::now());
    cleanup_old_logs(log_dir, &file_name).map_err(io_err)?;

    let file_appender = tracing_appender::rolling::never(log_dir, &file_name);
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer().with_target(true);
    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking_appender);

    let env_filter = EnvFilter::builder()
        .with_default_directive(parse_level(log_level).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!("Logging initialized with level: {}", log_level);
    Ok(guard)
}

fn log_file_name<Tz: chrono::TimeZone>(now: &chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.log", LOG_PREFIX, now.format("%Y-%m-%d_%H-%M-%S"))
}

// Removes every `.log` file in `log_dir` except `keep`. Returns how many went.
fn cleanup_old_logs(log_dir: &Path, keep: &str) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(log_dir)?.filter_map(|res| res.ok()) {
        let path = entry.path();
        let is_log = path.extension().is_some_and(|ext| ext == "log");
        if !is_log || entry.file_name() == keep {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Failed to delete old log file {:?}: {}", path, e),
        }
    }
    Ok(removed)
}
