// src/utils/logging.rs
//! Logging utilities for the application.
//!
//! Diagnostics go to stderr so that command output on stdout stays clean for
//! piping. `RUST_LOG` overrides the configured level when set.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::defaults::DEFAULT_LOG_FILE_PREFIX;

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Initialize the logging system with stderr output
pub fn init_logging(log_level: &str) -> io::Result<()> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(console_layer.with_filter(env_filter(log_level)))
        .try_init()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to initialize logging: {}", e),
            )
        })
}

/// Log to a daily-rolling file in addition to stderr.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// until the process exits.
pub fn init_file_logging(log_level: &str, log_file: &Path) -> io::Result<WorkerGuard> {
    let log_dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = log_file
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| DEFAULT_LOG_FILE_PREFIX.into());

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix.to_string_lossy())
        .build(log_dir)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_ansi(false);

    let console_layer = fmt::layer().with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(file_layer.with_filter(env_filter(log_level)))
        .with(console_layer.with_filter(env_filter(log_level)))
        .try_init()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to set global default subscriber: {}", e),
            )
        })?;

    Ok(guard)
}

/// Log a security event with structured fields
pub fn log_security_event(event_type: &str, details: &str) {
    tracing::warn!(
        security_event.type = event_type,
        security_event.details = details,
        "Security event: [{}] {}",
        event_type,
        details
    );
}
