// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// Directory the daemon watches for process definition documents
/// (§6 "Directory contract"). `WSCHED_READ_PATH` takes precedence over
/// the default data directory.
pub fn read_path() -> PathBuf {
    std::env::var("WSCHED_READ_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_data_dir().join("processes"))
}

/// Directory the daemon writes its periodic state snapshot to
/// (§6 "Persistence"). `WSCHED_SAVE_PATH` takes precedence over the
/// default data directory.
pub fn save_path() -> PathBuf {
    std::env::var("WSCHED_SAVE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_data_dir().join("state.json"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("wsched")
}

/// Log file path, if any (§B). Unset means log to stderr, which is the
/// right default for a foreground/interactive run; `WSCHED_LOG_PATH`
/// opts into file logging for a daemonized one.
pub fn log_path() -> Option<PathBuf> {
    std::env::var("WSCHED_LOG_PATH").ok().map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
