// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process definition document schema validation (§6, §9 "dataclass-style
//! field enumeration" note — the document's own human-readable field
//! names are the schema's property names, no separate display-name map).
//!
//! The schema is embedded at compile time rather than read from a schema
//! directory at startup; local `$ref`s resolve against its own
//! `definitions` section (grounded on the original's `RefResolver` over a
//! schema directory, minus the filesystem indirection).

use serde_json::Value;
use std::sync::OnceLock;
use wsched_core::SchedulerError;

const PROCESS_SCHEMA: &str = include_str!("../schema/process.schema.json");

static VALIDATOR: OnceLock<jsonschema::Validator> = OnceLock::new();

#[allow(clippy::expect_used)]
fn validator() -> &'static jsonschema::Validator {
    VALIDATOR.get_or_init(|| {
        let schema: Value =
            serde_json::from_str(PROCESS_SCHEMA).expect("embedded process schema is valid JSON");
        jsonschema::validator_for(&schema).expect("embedded process schema compiles")
    })
}

/// Validate a decoded process definition document against the process
/// schema (§7 "ConfigError ... schema validation: logged at warning, file
/// skipped").
pub fn validate_process_document(document: &Value) -> Result<(), SchedulerError> {
    validator()
        .validate(document)
        .map_err(|error| SchedulerError::Config(format!("schema validation failed: {error}")))
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
