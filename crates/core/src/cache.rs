// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hierarchical parameter cache (§3 "Parameter Cache", §4.1).
//!
//! A tree mirroring the entity id hierarchy. Each node holds its own
//! parameter overrides; a lookup layers every ancestor's parameters
//! ancestor-first, the node's own parameters last, then writes the
//! reserved `entity_id` key over the top. The original writes
//! `entity_id` *before* layering the ancestor chain in, so a stray
//! `entity_id` key inherited from an ancestor's parameters silently
//! shadows the real one; writing it last, as done here, is the fix
//! (§9 note (c)).

use crate::error::SchedulerError;
use crate::id::EntityId;
use crate::ENTITY_ID_KEY;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::info;

type CacheHandler = Box<dyn Fn(&ParameterCache) + Send + Sync>;
type EntityHandler = Box<dyn Fn(&Value, &HashMap<String, Value>) + Send + Sync>;

/// Handlers are process-local behavior, not data, so a cache that has
/// crossed a `serde` boundary (snapshot round-trip) comes back with
/// none installed; the host re-attaches them after `load_state` (§9
/// "callables serialize to null").
#[derive(Serialize, Deserialize)]
pub struct ParameterCache {
    root: EntityId,
    nodes: HashSet<EntityId>,
    parameters: HashMap<EntityId, HashMap<String, Value>>,
    metadata: HashMap<EntityId, Value>,
    #[serde(skip)]
    cache_handler: Option<CacheHandler>,
    #[serde(skip)]
    entity_handler: Option<EntityHandler>,
}

/// Handlers are dropped on clone, same as on a `serde` round-trip — a
/// clone is itself a new cache instance that has not had handlers
/// re-attached yet.
impl Clone for ParameterCache {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            nodes: self.nodes.clone(),
            parameters: self.parameters.clone(),
            metadata: self.metadata.clone(),
            cache_handler: None,
            entity_handler: None,
        }
    }
}

impl ParameterCache {
    pub fn new(root: EntityId, root_parameters: HashMap<String, Value>) -> Self {
        let mut parameters = HashMap::new();
        parameters.insert(root.clone(), root_parameters);
        let mut nodes = HashSet::new();
        nodes.insert(root.clone());
        Self {
            root,
            nodes,
            parameters,
            metadata: HashMap::new(),
            cache_handler: None,
            entity_handler: None,
        }
    }

    pub fn set_cache_handler(&mut self, handler: impl Fn(&ParameterCache) + Send + Sync + 'static) {
        self.cache_handler = Some(Box::new(handler));
    }

    pub fn set_entity_handler(
        &mut self,
        handler: impl Fn(&Value, &HashMap<String, Value>) + Send + Sync + 'static,
    ) {
        self.entity_handler = Some(Box::new(handler));
    }

    /// Register `id` as a child node. Its parent must already be
    /// registered, unless `id` is the cache's own root (§4.1 "set_child").
    pub fn set_child(&mut self, id: EntityId) -> Result<(), SchedulerError> {
        if id == self.root {
            return Ok(());
        }
        match id.parent() {
            Some(parent) if self.nodes.contains(&parent) => {
                self.nodes.insert(id.clone());
                self.parameters.entry(id).or_default();
                Ok(())
            }
            _ => Err(SchedulerError::BadId(id)),
        }
    }

    pub fn set_parameters(&mut self, id: &EntityId, parameters: HashMap<String, Value>) {
        self.parameters.insert(id.clone(), parameters);
    }

    /// Merge new values into a registered node's parameters.
    pub fn update_parameters(
        &mut self,
        id: &EntityId,
        parameters: HashMap<String, Value>,
    ) -> Result<(), SchedulerError> {
        let entry = self
            .parameters
            .get_mut(id)
            .ok_or_else(|| SchedulerError::BadId(id.clone()))?;
        entry.extend(parameters);
        Ok(())
    }

    /// Layer ancestor-to-node parameters (ancestor first, node's own
    /// overrides last), then stamp the reserved `entity_id` key.
    pub fn get_parameters(&self, id: &EntityId, look_back: bool) -> HashMap<String, Value> {
        let mut layers = Vec::new();
        if look_back {
            layers.extend(id.ancestors().into_iter().rev());
        }
        layers.push(id.clone());

        let mut out = HashMap::new();
        for layer in layers {
            if let Some(params) = self.parameters.get(&layer) {
                out.extend(params.clone());
            }
        }
        out.insert(ENTITY_ID_KEY.to_string(), Value::String(id.to_string()));
        out
    }

    pub fn set_metadata(&mut self, id: EntityId, metadata: Value) {
        self.metadata.insert(id, metadata);
    }

    pub fn get_metadata(&self, id: &EntityId) -> Option<&Value> {
        self.metadata.get(id)
    }

    /// Record a status/metadata snapshot and, unless suppressed, notify
    /// the cache and entity handlers (§4.1 "read_state").
    pub fn read_state(&mut self, id: EntityId, metadata: Value, run_handlers: bool) {
        self.set_metadata(id.clone(), metadata.clone());
        if run_handlers {
            if let Some(handler) = &self.cache_handler {
                handler(self);
            }
            if let Some(handler) = &self.entity_handler {
                let params = self.get_parameters(&id, true);
                handler(&metadata, &params);
            }
        }
    }

    /// Convenience wrapper over [`update_parent_cache`] (SPEC_FULL §F.1).
    pub fn update_parent(
        &mut self,
        child_id: &EntityId,
        new_parameters: HashMap<String, Value>,
    ) -> Result<(), SchedulerError> {
        update_parent_cache(self, child_id, new_parameters)
    }

    /// Convenience wrapper over [`update_process_cache`] (SPEC_FULL §F.1).
    pub fn update_process(
        &mut self,
        entity_id: &EntityId,
        new_parameters: HashMap<String, Value>,
    ) -> Result<(), SchedulerError> {
        update_process_cache(self, entity_id, new_parameters)
    }
}

/// Update the parent node's parameters, logging the merged values
/// (SPEC_FULL §F.1, grounded on the original's module-level
/// `update_parent_cache` helper).
pub fn update_parent_cache(
    cache: &mut ParameterCache,
    child_id: &EntityId,
    new_parameters: HashMap<String, Value>,
) -> Result<(), SchedulerError> {
    let parent_id = child_id.parent().ok_or_else(|| SchedulerError::BadId(child_id.clone()))?;
    info!(parent = %parent_id, params = ?new_parameters, "parent parameters updated");
    cache.update_parameters(&parent_id, new_parameters)
}

/// Update the owning process's parameters, two levels up from `entity_id`
/// (SPEC_FULL §F.1, grounded on the original's `update_process_cache`).
pub fn update_process_cache(
    cache: &mut ParameterCache,
    entity_id: &EntityId,
    new_parameters: HashMap<String, Value>,
) -> Result<(), SchedulerError> {
    let segments = entity_id.segments();
    if segments.len() < 2 {
        return Err(SchedulerError::BadId(entity_id.clone()));
    }
    let process_id = EntityId::new(segments[..2].join("."));
    info!(process = %process_id, params = ?new_parameters, "process parameters updated");
    cache.update_parameters(&process_id, new_parameters)
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
