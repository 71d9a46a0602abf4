// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format for a process definition document (§6, §9 design note on
//! "dual names" — one declared field table using the document's own
//! human-readable keys, rather than a display-name/internal-name mapping
//! layer).

use serde::{Deserialize, Serialize};
use wsched_core::job::JobParameters;

/// One node in a process definition document: a Job, a JobGroup, or a
/// Process, disambiguated by `object_type` (§6). Also the persisted
/// shape of a tracked config (§6 "Persistence"): re-serializing a
/// parsed document lets a snapshot store "what a trigger was built
/// from" without re-reading the original file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDocument {
    #[serde(rename = "Object Type")]
    pub object_type: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    /// `HH:MM:SS` duration, applied relative to this entity's start time.
    #[serde(rename = "Deadline", default)]
    pub deadline: Option<String>,

    #[serde(rename = "Exception Handling", default)]
    pub exception_handling: Option<String>,

    /// `[module_path, function_name]` pairs.
    #[serde(rename = "Conditions", default)]
    pub conditions: Vec<(String, String)>,

    /// Sibling `Name`s this entity depends on; resolved to ids by the
    /// factory after all siblings exist (§4.6).
    #[serde(rename = "Dependencies", default)]
    pub dependencies: Vec<String>,

    /// Present only on a `Process` document.
    #[serde(rename = "Trigger", default)]
    pub trigger: Option<TriggerDocument>,

    /// Present only on a `Job` document.
    #[serde(rename = "Run Type", default)]
    pub run_type: Option<String>,
    #[serde(rename = "Command", default)]
    pub command: Option<String>,
    #[serde(rename = "Module", default)]
    pub module: Option<String>,
    #[serde(rename = "Parameters", default)]
    pub parameters: Option<JobParameters>,
    #[serde(rename = "Parameter Delimiter", default)]
    pub parameter_delimiter: Option<String>,
    #[serde(rename = "Success Code", default)]
    pub success_code: Option<i32>,

    /// Present only on a `JobGroup` document.
    #[serde(rename = "Jobs", default)]
    pub jobs: Option<Vec<EntityDocument>>,

    /// Present only on a `Process` document.
    #[serde(rename = "Entity List", default)]
    pub entity_list: Option<Vec<EntityDocument>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDocument {
    #[serde(rename = "Trigger Type")]
    pub trigger_type: String,
    #[serde(rename = "Cron Expression", default)]
    pub cron_expression: Option<String>,
    #[serde(rename = "Trigger Time", default)]
    pub trigger_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "Modifier Action", default)]
    pub modifier_action: Option<String>,
}
