// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds a live entity tree from a process definition document (§4.6),
//! and the companion trigger builder that arms a `Process`'s schedule.

use crate::document::{EntityDocument, TriggerDocument};
use crate::trigger::{DateModifierFn, DateModifierPolicy, Trigger, TriggerCallback};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;
use wsched_core::entity::{ConditionRef, Entity, ExceptionHandling, ObjectType};
use wsched_core::job::{Job, JobConfig, RunType};
use wsched_core::job_group::{JobGroup, Process};
use wsched_core::{EntityId, EntityMeta, ParameterCache, SchedulerError};

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("unrecognized object type '{0}'")]
    UnknownObjectType(String),

    #[error("job '{0}' has no recognized run type")]
    UnknownRunType(String),

    #[error("unrecognized trigger type '{0}'")]
    UnknownTriggerType(String),

    #[error("unrecognized exception handling policy '{0}'")]
    UnknownExceptionHandling(String),

    #[error("unrecognized modifier action '{0}'")]
    UnknownModifierAction(String),

    #[error("invalid deadline '{raw}': {reason}")]
    InvalidDeadline { raw: String, reason: String },

    #[error("cron trigger is missing a cron expression")]
    MissingCronExpression,

    #[error("datetime trigger is missing a trigger time")]
    MissingTriggerTime,

    #[error(transparent)]
    Cache(#[from] SchedulerError),
}

/// Turns a process definition document into a live entity tree rooted
/// under a scheduler-assigned id (§4.6).
pub struct EntityFactory;

impl EntityFactory {
    /// Build the top-level `Process` under `scheduler_root` (§3 "Process",
    /// §4.6 step 1: allocate an id by sibling enumeration, reserve it in
    /// the cache, then recurse into `Entity List`).
    pub fn parse_process(
        scheduler_root: &EntityId,
        doc: &EntityDocument,
        cache: &mut ParameterCache,
    ) -> Result<Process, FactoryError> {
        if doc.object_type != "Process" {
            return Err(FactoryError::UnknownObjectType(doc.object_type.clone()));
        }

        let id = scheduler_root.next_child(ObjectType::Process.id_prefix(), std::iter::empty());
        cache.set_child(id.clone())?;

        let mut process = Process::new(doc.name.clone(), id.clone());
        apply_common(process.meta_mut(), doc)?;
        process.conditions = process.meta().conditions.clone();

        let child_docs = doc.entity_list.as_deref().unwrap_or(&[]);
        for child in Self::parse_children(&id, child_docs, cache)? {
            process.group.add_entity(child);
        }

        Ok(process)
    }

    /// Parse a list of sibling `Job`/`JobGroup` documents under `parent_id`,
    /// then resolve each one's declared `Dependencies` against the sibling
    /// names just parsed. A name with no matching sibling is dropped with
    /// a warning rather than failing the build (§4.6 step 2).
    fn parse_children(
        parent_id: &EntityId,
        docs: &[EntityDocument],
        cache: &mut ParameterCache,
    ) -> Result<Vec<Entity>, FactoryError> {
        let mut children = Vec::with_capacity(docs.len());
        let mut allocated: Vec<EntityId> = Vec::with_capacity(docs.len());
        let mut name_to_id: HashMap<&str, EntityId> = HashMap::new();

        for doc in docs {
            let entity = Self::parse_entity(parent_id, doc, cache, allocated.iter().cloned())?;
            allocated.push(entity.entity_id().clone());
            name_to_id.insert(doc.name.as_str(), entity.entity_id().clone());
            children.push(entity);
        }

        for (child, doc) in children.iter_mut().zip(docs) {
            for dep_name in &doc.dependencies {
                match name_to_id.get(dep_name.as_str()) {
                    Some(id) => child.meta_mut().add_dependency(dep_name.clone(), Some(id.clone())),
                    None => warn!(
                        entity_id = %child.entity_id(),
                        dependency = %dep_name,
                        "unresolved dependency name dropped"
                    ),
                }
            }
        }

        Ok(children)
    }

    fn parse_entity(
        parent_id: &EntityId,
        doc: &EntityDocument,
        cache: &mut ParameterCache,
        siblings: impl Iterator<Item = EntityId>,
    ) -> Result<Entity, FactoryError> {
        let object_type = match doc.object_type.as_str() {
            "Job" => ObjectType::Job,
            "JobGroup" => ObjectType::JobGroup,
            other => return Err(FactoryError::UnknownObjectType(other.to_string())),
        };

        let id = parent_id.next_child(object_type.id_prefix(), siblings);
        cache.set_child(id.clone())?;

        let entity = match object_type {
            ObjectType::Job => Entity::Job(Self::build_job(&id, doc)?),
            ObjectType::JobGroup => {
                let mut group = JobGroup::new(doc.name.clone(), id.clone());
                apply_common(&mut group.meta, doc)?;
                let child_docs = doc.jobs.as_deref().unwrap_or(&[]);
                for child in Self::parse_children(&id, child_docs, cache)? {
                    group.add_entity(child);
                }
                Entity::JobGroup(group)
            }
            ObjectType::Process => unreachable!("Process is never a child entity"),
        };

        Ok(entity)
    }

    fn build_job(id: &EntityId, doc: &EntityDocument) -> Result<Job, FactoryError> {
        let run_type = match doc.run_type.as_deref() {
            Some("python") => RunType::Python,
            Some("cmd") => RunType::Cmd,
            _ => return Err(FactoryError::UnknownRunType(doc.name.clone())),
        };

        let mut builder = JobConfig::builder(
            doc.name.clone(),
            id.clone(),
            doc.command.clone().unwrap_or_default(),
            run_type,
        )
        .description(doc.description.clone());

        if let Some(module) = &doc.module {
            builder = builder.module(module.clone());
        }
        if let Some(parameters) = &doc.parameters {
            builder = builder.parameters(parameters.clone());
        }
        if let Some(delimiter) = &doc.parameter_delimiter {
            builder = builder.parameter_delimiter(delimiter.clone());
        }
        if let Some(code) = doc.success_code {
            builder = builder.success_code(code);
        }
        if let Some(raw) = &doc.exception_handling {
            builder = builder.exception_handling(parse_exception_handling(raw)?);
        }
        builder = builder.conditions(parse_conditions(doc));

        let mut job = Job::new(builder.build());
        job.meta.deadline_offset = parse_deadline(doc.deadline.as_deref())?;
        Ok(job)
    }
}

/// Apply the fields common to every entity kind (§3 "Entity (abstract)").
fn apply_common(meta: &mut EntityMeta, doc: &EntityDocument) -> Result<(), FactoryError> {
    meta.description = doc.description.clone();
    if let Some(raw) = &doc.exception_handling {
        meta.exception_handling = parse_exception_handling(raw)?;
    }
    meta.deadline_offset = parse_deadline(doc.deadline.as_deref())?;
    meta.conditions = parse_conditions(doc);
    Ok(())
}

fn parse_conditions(doc: &EntityDocument) -> Vec<ConditionRef> {
    doc.conditions
        .iter()
        .map(|(module, function)| ConditionRef { module: module.clone(), function: function.clone() })
        .collect()
}

fn parse_exception_handling(raw: &str) -> Result<ExceptionHandling, FactoryError> {
    match raw {
        "kill" => Ok(ExceptionHandling::Kill),
        "repeat" => Ok(ExceptionHandling::Repeat),
        "skip" => Ok(ExceptionHandling::Skip),
        other => Err(FactoryError::UnknownExceptionHandling(other.to_string())),
    }
}

/// Parse a `HH:MM:SS` deadline offset (§4.2 "authored as HH:MM:SS").
fn parse_deadline(raw: Option<&str>) -> Result<Option<std::time::Duration>, FactoryError> {
    let Some(raw) = raw else { return Ok(None) };
    let parts: Vec<&str> = raw.split(':').collect();
    let [h, m, s] = parts.as_slice() else {
        return Err(FactoryError::InvalidDeadline {
            raw: raw.to_string(),
            reason: "expected HH:MM:SS".to_string(),
        });
    };
    let parse_u64 = |s: &str| -> Result<u64, FactoryError> {
        s.parse().map_err(|_| FactoryError::InvalidDeadline {
            raw: raw.to_string(),
            reason: format!("'{s}' is not a non-negative integer"),
        })
    };
    let total_secs = parse_u64(h)? * 3600 + parse_u64(m)? * 60 + parse_u64(s)?;
    Ok(Some(std::time::Duration::from_secs(total_secs)))
}

/// Selects a [`Trigger`] variant from `Trigger Type` and resolves
/// `Modifier Action`, defaulting to `keep` when absent (§4.6, §9 note (c)
/// sibling decision recorded for modifier defaults).
pub struct TriggerFactory;

impl TriggerFactory {
    pub fn create_trigger(
        trigger_doc: &TriggerDocument,
        callback: TriggerCallback,
        date_modifier: Option<DateModifierFn>,
    ) -> Result<Trigger, FactoryError> {
        let modifier_action = match trigger_doc.modifier_action.as_deref() {
            None | Some("keep") => DateModifierPolicy::Keep,
            Some("unmodify") => DateModifierPolicy::Unmodify,
            Some("delete") => DateModifierPolicy::Delete,
            Some(other) => return Err(FactoryError::UnknownModifierAction(other.to_string())),
        };

        match trigger_doc.trigger_type.as_str() {
            "cron" => {
                let expression =
                    trigger_doc.cron_expression.as_deref().ok_or(FactoryError::MissingCronExpression)?;
                Trigger::cron(expression, callback, date_modifier, modifier_action).map_err(FactoryError::from)
            }
            "datetime" => {
                let trigger_time = trigger_doc.trigger_time.ok_or(FactoryError::MissingTriggerTime)?;
                Ok(Trigger::date(trigger_time, callback, date_modifier, modifier_action))
            }
            "instant" => Ok(Trigger::instant(callback)),
            other => Err(FactoryError::UnknownTriggerType(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
