// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wsched-storage: atomic snapshot persistence for scheduler state (§6
//! "Persistence", §4.7 `save_state`/`load_state`).

pub mod snapshot;

pub use snapshot::{read_snapshot, write_snapshot, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
