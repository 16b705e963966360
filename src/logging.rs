//! Log output setup.
//!
//! Decode operations surface their warnings twice: structured warning lists
//! travel with each result for the caller, and the same events go through
//! `tracing` for operators. This module installs the subscriber for the
//! second surface: a log file plus stdout, filtered by `RUST_LOG`
//! (default `info`).

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the log file writer alive. Dropping the guard flushes and closes
/// the file; events logged after that only reach stdout.
#[derive(Debug)]
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Installs the global subscriber, writing to `log_file` and stdout.
///
/// The file's parent directory is created if missing and a previous file at
/// the path is truncated. Call once per process; the subscriber cannot be
/// replaced.
///
/// # Errors
///
/// Returns an error if `log_file` names no file, or if the directory
/// cannot be created or the file cannot be truncated.
pub fn init_logging(log_file: &Path) -> Result<LoggingGuard, io::Error> {
    let file_name = log_file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "log path has no file name"))?;
    let log_dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(log_dir)?;
    fs::write(log_file, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .pretty();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .with_span_events(FmtSpan::CLOSE)
        .pretty();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
