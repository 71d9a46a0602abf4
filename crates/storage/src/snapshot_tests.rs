// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::{Deserialize, Serialize};
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FakeState {
    processes: Vec<String>,
}

#[test]
fn round_trips_through_write_and_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scheduler.snapshot");
    let snapshot = Snapshot::new(FakeState { processes: vec!["S-1.P-1".to_string()] }, Utc::now());

    write_snapshot(&path, &snapshot).unwrap();
    let loaded: Snapshot<FakeState> = read_snapshot(&path).unwrap();

    assert_eq!(loaded.version, CURRENT_SNAPSHOT_VERSION);
    assert_eq!(loaded.state, snapshot.state);
}

#[test]
fn second_write_rotates_previous_into_bak() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scheduler.snapshot");
    let first = Snapshot::new(FakeState { processes: vec!["first".to_string()] }, Utc::now());
    let second = Snapshot::new(FakeState { processes: vec!["second".to_string()] }, Utc::now());

    write_snapshot(&path, &first).unwrap();
    write_snapshot(&path, &second).unwrap();

    let bak_path = path.with_extension("bak");
    assert!(bak_path.exists());
    let bak: Snapshot<FakeState> = read_snapshot(&bak_path).unwrap();
    assert_eq!(bak.state.processes, vec!["first".to_string()]);

    let current: Snapshot<FakeState> = read_snapshot(&path).unwrap();
    assert_eq!(current.state.processes, vec!["second".to_string()]);
}

#[test]
fn backups_beyond_the_limit_are_dropped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scheduler.snapshot");
    for i in 0..5 {
        let snapshot = Snapshot::new(FakeState { processes: vec![format!("gen-{i}")] }, Utc::now());
        write_snapshot(&path, &snapshot).unwrap();
    }

    assert!(path.with_extension("bak").exists());
    assert!(path.with_extension("bak.2").exists());
    assert!(path.with_extension("bak.3").exists());
    assert!(!path.with_extension("bak.4").exists());
}

#[test]
fn reading_a_missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.snapshot");
    let err = read_snapshot::<FakeState>(&path).unwrap_err();
    assert!(matches!(err, SnapshotError::Io(_)));
}
