// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DAG-of-jobs container (§3 "JobGroup", §4.4) and the top-level
//! triggerable unit built on top of it (§3 "Process", §9 design note (b)).
//!
//! The original scheduler tracks a job group's dependency graph as a
//! pandas adjacency matrix and loops while its sum is nonzero, zeroing a
//! *row* when the corresponding entity finishes. That zeroes the wrong
//! axis: a dependency matrix has `graph[child][parent] = 1`, so a child
//! becomes runnable when its *row* sums to zero, and a finished entity
//! should stop blocking its dependents by clearing the *column* it
//! occupies as a parent, not its own row (§9 note (a)). This module keeps
//! a sparse edge set instead of a matrix and implements the corrected
//! column-clear semantics directly: [`JobGroup::mark_finished`] removes
//! the finished id from every other entity's still-pending predecessor
//! set.

use crate::entity::{Conditions, Entity, EntityMeta, ExceptionHandling, ObjectType};
use crate::error::SchedulerError;
use crate::id::EntityId;
use crate::Status;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobGroup {
    pub meta: EntityMeta,
    pub graph_entities: HashMap<EntityId, Entity>,
    /// child id -> ids it is still waiting on. Populated by
    /// [`generate_graph`](JobGroup::generate_graph), mutated by
    /// [`mark_finished`](JobGroup::mark_finished).
    #[serde(skip)]
    pending: HashMap<EntityId, HashSet<EntityId>>,
    #[serde(skip)]
    graph_generated: bool,
}

impl JobGroup {
    pub fn new(name: impl Into<String>, entity_id: EntityId) -> Self {
        let mut meta = EntityMeta::new(name, entity_id, ObjectType::JobGroup);
        meta.exception_handling = ExceptionHandling::Repeat;
        Self {
            meta,
            graph_entities: HashMap::new(),
            pending: HashMap::new(),
            graph_generated: false,
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.meta.entity_id
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.graph_entities.insert(entity.entity_id().clone(), entity);
        self.graph_generated = false;
    }

    pub fn get_entities(&self) -> &HashMap<EntityId, Entity> {
        &self.graph_entities
    }

    pub fn get_entity_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.graph_entities.keys()
    }

    /// Build the dependency edge set from each entity's declared
    /// dependencies (§4.4 "generate_graph"). Idempotent: calling this
    /// again after entities have started executing does not reset
    /// progress already recorded by [`mark_finished`].
    pub fn generate_graph(&mut self) {
        if self.graph_generated {
            return;
        }
        for (id, entity) in &self.graph_entities {
            let preds: HashSet<EntityId> = entity
                .meta()
                .dependency_ids()
                .filter(|dep| self.graph_entities.contains_key(*dep))
                .cloned()
                .collect();
            self.pending.insert(id.clone(), preds);
        }
        self.graph_generated = true;
    }

    /// Entities with no unfinished predecessor that have not yet finished.
    pub fn ready_entities(&self) -> Vec<&EntityId> {
        self.pending
            .iter()
            .filter(|(id, preds)| {
                preds.is_empty()
                    && self
                        .graph_entities
                        .get(*id)
                        .is_some_and(|e| e.status() != Status::Finished)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Clear `id` from every other entity's pending-predecessor set
    /// (column-zero, §9 note (a)).
    pub fn mark_finished(&mut self, id: &EntityId) {
        for preds in self.pending.values_mut() {
            preds.remove(id);
        }
    }

    /// True once every entity in the graph has reached `finished`.
    pub fn is_complete(&self) -> bool {
        self.graph_entities.values().all(|e| e.status() == Status::Finished)
    }

    /// Highest failure code observed so far among terminally-failed or
    /// unsuccessful children (§4.4 "max-code propagation").
    pub fn max_failure_code(&self) -> i32 {
        self.graph_entities
            .values()
            .map(|e| e.status().code())
            .filter(|code| *code > 0)
            .max()
            .unwrap_or(0)
    }

    pub fn terminate(&mut self, now: Instant) {
        if self.meta.status != Status::Finished {
            self.meta.force_terminate(now);
            for child in self.graph_entities.values_mut() {
                match child {
                    Entity::Job(j) => j.terminate(now),
                    Entity::JobGroup(g) => g.terminate(now),
                }
            }
        }
    }
}

/// The scheduler's unit of execution (§3 "Process"). Reuses
/// [`JobGroup`]'s DAG bookkeeping verbatim but is never itself a node in
/// another group's graph — its deadline is a ceiling inherited by nothing
/// (§9 note (b)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    #[serde(flatten)]
    pub group: JobGroup,
    pub conditions: Conditions,
}

impl Process {
    pub fn new(name: impl Into<String>, entity_id: EntityId) -> Self {
        let mut group = JobGroup::new(name, entity_id);
        group.meta.object_type = ObjectType::Process;
        Self { group, conditions: Vec::new() }
    }

    pub fn entity_id(&self) -> &EntityId {
        self.group.entity_id()
    }

    pub fn meta(&self) -> &EntityMeta {
        &self.group.meta
    }

    pub fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.group.meta
    }

    /// Enter `running`, arming the process's own deadline with no
    /// inherited ceiling (§4.2, §9 note (b)).
    pub fn start(&mut self, now: Instant) -> Result<(), SchedulerError> {
        self.group.meta.start(now, None)
    }
}

#[cfg(test)]
#[path = "job_group_tests.rs"]
mod tests;
