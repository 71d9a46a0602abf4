// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn linear_process() -> Value {
    json!({
        "Object Type": "Process",
        "Name": "daily",
        "Entity List": [
            {"Object Type": "Job", "Name": "A", "Run Type": "cmd", "Command": "true"},
            {"Object Type": "Job", "Name": "B", "Run Type": "cmd", "Command": "true", "Dependencies": ["A"]},
        ],
    })
}

#[test]
fn accepts_a_well_formed_process_document() {
    assert!(validate_process_document(&linear_process()).is_ok());
}

#[test]
fn rejects_a_document_missing_entity_list() {
    let document = json!({"Object Type": "Process", "Name": "daily"});
    assert!(validate_process_document(&document).is_err());
}

#[test]
fn rejects_an_unrecognized_run_type() {
    let document = json!({
        "Object Type": "Process",
        "Name": "daily",
        "Entity List": [
            {"Object Type": "Job", "Name": "A", "Run Type": "java", "Command": "true"},
        ],
    });
    assert!(validate_process_document(&document).is_err());
}

#[test]
fn rejects_a_malformed_deadline() {
    let document = json!({
        "Object Type": "Process",
        "Name": "daily",
        "Deadline": "not-a-duration",
        "Entity List": [],
    });
    assert!(validate_process_document(&document).is_err());
}

#[test]
fn accepts_a_nested_job_group() {
    let document = json!({
        "Object Type": "Process",
        "Name": "daily",
        "Entity List": [
            {
                "Object Type": "JobGroup",
                "Name": "inner",
                "Jobs": [
                    {"Object Type": "Job", "Name": "A", "Run Type": "cmd", "Command": "true"},
                ],
            },
        ],
    });
    assert!(validate_process_document(&document).is_ok());
}
