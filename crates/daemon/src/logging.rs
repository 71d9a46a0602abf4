// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup logging setup (SPEC_FULL §B), grounded on the teacher's
//! `setup_logging`: an `EnvFilter` (`RUST_LOG`-controlled, default
//! `info`) over either a rolling file or stderr.

use std::path::Path;
use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Either a non-blocking file appender or stderr, depending on whether the
/// daemon was given a log file path. The returned guard must be kept alive
/// for the life of the process — dropping it stops the background writer.
pub enum LogGuard {
    File(tracing_appender::non_blocking::WorkerGuard),
    Stderr,
}

/// Install the global `tracing` subscriber. `log_path` of `None` logs to
/// stderr, matching interactive/foreground use; a daemonized run passes a
/// file path instead.
pub fn init(log_path: Option<&Path>) -> Result<LogGuard, LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("wsd.log"));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking))
                .init();
            Ok(LogGuard::File(guard))
        }
        None => {
            tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(std::io::stderr)).init();
            Ok(LogGuard::Stderr)
        }
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
