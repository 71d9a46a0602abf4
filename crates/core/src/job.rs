// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The leaf entity: a single unit of work dispatched to an evaluator (§3
//! "Job", §4.3).

use crate::entity::{Conditions, EntityMeta, ExceptionHandling, ObjectType};
use crate::error::SchedulerError;
use crate::id::EntityId;
use crate::paramfmt::{fill_string, flat_args, parse_arguments};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};

/// Which evaluator a job dispatches to (§4.3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    Python,
    Cmd,
}

crate::simple_display! {
    RunType {
        Python => "python",
        Cmd => "cmd",
    }
}

/// A job's declared parameters: either a named mapping or a positional
/// list (§6 "parameters").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobParameters {
    Map(HashMap<String, Value>),
    List(Vec<Value>),
}

impl Default for JobParameters {
    fn default() -> Self {
        JobParameters::Map(HashMap::new())
    }
}

/// Configuration used to construct a new [`Job`] (factory-facing, §4.6).
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub name: String,
    pub entity_id: EntityId,
    pub command: String,
    pub run_type: RunType,
    pub module: Option<String>,
    pub parameters: JobParameters,
    pub parameter_delimiter: String,
    pub success_code: i32,
    pub exception_handling: ExceptionHandling,
    pub description: String,
    pub conditions: Conditions,
}

impl JobConfig {
    pub fn builder(
        name: impl Into<String>,
        entity_id: EntityId,
        command: impl Into<String>,
        run_type: RunType,
    ) -> JobConfigBuilder {
        JobConfigBuilder {
            name: name.into(),
            entity_id,
            command: command.into(),
            run_type,
            module: None,
            parameters: JobParameters::default(),
            parameter_delimiter: "; ".to_string(),
            success_code: 0,
            exception_handling: ExceptionHandling::default(),
            description: String::new(),
            conditions: Vec::new(),
        }
    }
}

pub struct JobConfigBuilder {
    name: String,
    entity_id: EntityId,
    command: String,
    run_type: RunType,
    module: Option<String>,
    parameters: JobParameters,
    parameter_delimiter: String,
    success_code: i32,
    exception_handling: ExceptionHandling,
    description: String,
    conditions: Conditions,
}

impl JobConfigBuilder {
    crate::setters! {
        into {
            parameter_delimiter: String,
            description: String,
        }
        set {
            parameters: JobParameters,
            success_code: i32,
            exception_handling: ExceptionHandling,
            conditions: Conditions,
        }
        option {
            module: String,
        }
    }

    pub fn build(self) -> JobConfig {
        JobConfig {
            name: self.name,
            entity_id: self.entity_id,
            command: self.command,
            run_type: self.run_type,
            module: self.module,
            parameters: self.parameters,
            parameter_delimiter: self.parameter_delimiter,
            success_code: self.success_code,
            exception_handling: self.exception_handling,
            description: self.description,
            conditions: self.conditions,
        }
    }
}

/// A resolved command and its flattened, printable argument string, ready
/// for an [`Evaluator`](crate::job::Job::build_invocation) to dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: String,
    pub module: Option<String>,
    pub arguments: JobParameters,
    pub flat_arguments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub command: String,
    pub run_type: RunType,
    pub module: Option<String>,
    pub parameters: JobParameters,
    pub parameter_delimiter: String,
    pub success_code: i32,
    #[serde(skip)]
    pub return_code: Option<i32>,
    #[serde(default)]
    pub message: String,
}

impl Job {
    pub fn new(config: JobConfig) -> Self {
        let mut meta = EntityMeta::new(config.name, config.entity_id, ObjectType::Job);
        meta.description = config.description;
        meta.exception_handling = config.exception_handling;
        meta.conditions = config.conditions;
        Self {
            meta,
            command: config.command,
            run_type: config.run_type,
            module: config.module,
            parameters: config.parameters,
            parameter_delimiter: config.parameter_delimiter,
            success_code: config.success_code,
            return_code: None,
            message: String::new(),
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.meta.entity_id
    }

    /// Resolve parameters, fill placeholders, and produce the concrete
    /// command/module/arguments an evaluator should run (§4.3 steps 1-4).
    pub fn build_invocation(&self, params: &HashMap<String, Value>) -> Result<Invocation, SchedulerError> {
        let arguments = parse_arguments(self.entity_id(), &self.parameters, params)?;
        let flat_arguments = flat_args(&arguments, &self.parameter_delimiter);
        let command = fill_string(self.entity_id(), &self.command, params)?;
        let module = self
            .module
            .as_deref()
            .map(|m| fill_string(self.entity_id(), m, params))
            .transpose()?;
        Ok(Invocation { command, module, arguments, flat_arguments })
    }

    /// Record the evaluator's return code and decide success (§4.3 step 5):
    /// success iff `return_code == success_code`.
    pub fn record_result(&mut self, return_code: i32) -> bool {
        self.return_code = Some(return_code);
        return_code == self.success_code
    }

    /// Append to the accumulated message log, suppressing repeated warnings
    /// while `re_running` (spec's resolution of the original's
    /// warning-suppression behavior, SPEC_FULL §F.3).
    pub fn log(&mut self, message: &str, warning: bool) {
        self.message.push_str(message);
        if self.meta.status != crate::Status::ReRunning {
            if warning {
                warn!(entity_id = %self.entity_id(), "{message}");
                if self.meta.exception_handling == ExceptionHandling::Repeat {
                    info!(
                        entity_id = %self.entity_id(),
                        "{} will re-run; further warnings for this instance are silenced until its deadline passes",
                        self.meta.name
                    );
                }
            } else {
                info!(entity_id = %self.entity_id(), "{message}");
            }
        }
    }

    pub fn terminate(&mut self, now: std::time::Instant) {
        self.meta.force_terminate(now);
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
