// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Common entity fields and the status state machine (spec §3, §4.2).

use crate::error::SchedulerError;
use crate::id::EntityId;
use crate::Status;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// The three concrete entity kinds (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ObjectType {
    Job,
    JobGroup,
    Process,
}

impl ObjectType {
    /// The id prefix used by [`EntityId::next_child`] (§3).
    pub fn id_prefix(self) -> &'static str {
        match self {
            ObjectType::Job => "J",
            ObjectType::JobGroup => "JG",
            ObjectType::Process => "P",
        }
    }
}

/// Policy applied when a node ends with a non-zero status code (§3, §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionHandling {
    Kill,
    #[default]
    Repeat,
    Skip,
}

/// A `[module, function]` reference to a predicate gated before a process
/// enters the run queue (§3 "conditions").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRef {
    pub module: String,
    pub function: String,
}

pub type Conditions = Vec<ConditionRef>;

/// Fields shared by every entity kind (§3 "Entity (abstract)").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMeta {
    pub name: String,
    pub entity_id: EntityId,
    pub object_type: ObjectType,
    #[serde(default)]
    pub description: String,
    /// name -> resolved sibling id; `None` until the factory resolves it,
    /// tolerated unresolved until execution (§3).
    #[serde(default)]
    pub dependencies: HashMap<String, Option<EntityId>>,
    #[serde(skip)]
    pub start_time: Option<Instant>,
    #[serde(skip)]
    pub end_time: Option<Instant>,
    #[serde(skip)]
    pub deadline: Option<Instant>,
    #[serde(skip)]
    pub timeout: Option<Duration>,
    /// Own deadline offset as authored (`HH:MM:SS`), applied relative to
    /// `start_time`, not an absolute instant (§4.2).
    #[serde(default)]
    pub deadline_offset: Option<Duration>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub exception_handling: ExceptionHandling,
    #[serde(default)]
    pub conditions: Conditions,
}

impl Default for Status {
    fn default() -> Self {
        Status::Initialized
    }
}

impl EntityMeta {
    pub fn new(name: impl Into<String>, entity_id: EntityId, object_type: ObjectType) -> Self {
        Self {
            name: name.into(),
            entity_id,
            object_type,
            description: String::new(),
            dependencies: HashMap::new(),
            start_time: None,
            end_time: None,
            deadline: None,
            timeout: None,
            deadline_offset: None,
            status: Status::Initialized,
            exception_handling: ExceptionHandling::default(),
            conditions: Vec::new(),
        }
    }

    pub fn add_dependency(&mut self, name: impl Into<String>, id: Option<EntityId>) {
        self.dependencies.insert(name.into(), id);
    }

    pub fn dependency_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.dependencies.values().filter_map(|v| v.as_ref())
    }

    /// Enter `running`/`re_running` (§4.2 "On entering running/re_running").
    ///
    /// `now` and `inherited_deadline` come from the caller's [`Clock`](crate::Clock)
    /// so tests can control time deterministically.
    pub fn start(&mut self, now: Instant, inherited_deadline: Option<Instant>) -> Result<(), SchedulerError> {
        match self.status {
            Status::Initialized => {
                self.start_time = Some(now);
                self.deadline = match self.deadline_offset {
                    Some(offset) => {
                        let own = now + offset;
                        Some(match inherited_deadline {
                            Some(inherited) => own.min(inherited),
                            None => own,
                        })
                    }
                    None => inherited_deadline,
                };
                self.status = Status::Running;
            }
            Status::Unsuccessful => {
                self.status = Status::ReRunning;
            }
            other => {
                return Err(SchedulerError::InvalidStatus {
                    entity_id: self.entity_id.clone(),
                    reason: format!("cannot start from status {other}"),
                });
            }
        }
        self.timeout = self.deadline.map(|d| d.saturating_duration_since(now));
        Ok(())
    }

    /// Leave `running`/`re_running` given a raw execution status code
    /// (0 = success, non-zero = failure) and this entity's exception
    /// handling policy (§4.2 "running | re_running -> ...").
    pub fn end(&mut self, now: Instant, execution_status_code: i32) -> Result<i32, SchedulerError> {
        self.status = if execution_status_code == Status::Finished.code() {
            Status::Finished
        } else {
            match self.exception_handling {
                ExceptionHandling::Kill => Status::Failure,
                ExceptionHandling::Repeat => Status::from_code(execution_status_code)
                    .unwrap_or(Status::Unsuccessful),
                ExceptionHandling::Skip => Status::Finished,
            }
        };

        if self.status != Status::Unsuccessful {
            self.end_time = Some(now);
        }

        Ok(self.status.code())
    }

    /// Force this entity into `failure`, regardless of current status
    /// (§4.2 "any non-terminal -> [terminate] -> failure").
    pub fn force_terminate(&mut self, now: Instant) {
        if self.status != Status::Finished {
            self.status = Status::Failure;
            self.end_time = Some(now);
        }
    }
}

/// Top-level entity enum, used as the child type inside a job-group's graph
/// (§3 "variants: Job, JobGroup, Process"). `Process` never appears as a
/// child — only as the scheduler's unit of execution — so it is not a
/// variant here.
#[derive(Debug, Clone)]
pub enum Entity {
    Job(crate::job::Job),
    JobGroup(crate::job_group::JobGroup),
}

impl Entity {
    pub fn meta(&self) -> &EntityMeta {
        match self {
            Entity::Job(j) => &j.meta,
            Entity::JobGroup(g) => &g.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut EntityMeta {
        match self {
            Entity::Job(j) => &mut j.meta,
            Entity::JobGroup(g) => &mut g.meta,
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.meta().entity_id
    }

    pub fn status(&self) -> Status {
        self.meta().status
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
