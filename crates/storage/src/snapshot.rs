// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence (§6 "Persistence").
//!
//! The scheduler's entire state — cache, process configs (minus live
//! trigger tasks), queues, and handlers — is periodically serialized to a
//! single file. Loading a snapshot must yield a scheduler ready to `run()`
//! again, so writes are atomic (temp file + rename) and the previous file
//! is rotated into a `.bak` slot rather than overwritten in place.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Current snapshot schema version.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An opaque, versioned snapshot of scheduler state. `S` is whatever the
/// daemon considers its complete serializable state; this crate only
/// owns the file format and the write/rotate/read mechanics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<S> {
    #[serde(rename = "v")]
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub state: S,
}

impl<S> Snapshot<S> {
    pub fn new(state: S, created_at: DateTime<Utc>) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, created_at, state }
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`. The
/// oldest backup is removed when the limit is reached.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

/// Write `snapshot` to `path`. The previous file at `path`, if any, is
/// rotated into a `.bak` slot first; the new content lands via a
/// temp-file-then-rename so a crash mid-write never corrupts the last
/// good snapshot.
pub fn write_snapshot<S: Serialize>(path: &Path, snapshot: &Snapshot<S>) -> Result<(), SnapshotError> {
    if path.exists() {
        let bak = rotate_bak_path(path);
        fs::rename(path, bak)?;
    }
    let tmp = path.with_extension("tmp");
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), "wrote scheduler snapshot");
    Ok(())
}

/// Read and deserialize a snapshot previously written by [`write_snapshot`].
pub fn read_snapshot<S: DeserializeOwned>(path: &Path) -> Result<Snapshot<S>, SnapshotError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
