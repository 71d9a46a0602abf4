// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler configuration (§4.7, SPEC_FULL §D), grounded on the original
//! `LocalScheduler.__init__` parameters: `read_path`, `save_path`,
//! `date_modifier`, `termination_handler`, `cache_handler`,
//! `entity_handler`, `session_parameters`. `python_evaluator` is this
//! crate's own addition, not in that parameter list, since Rust has no
//! analogue of loading an interpreted module off disk — the host
//! registers one evaluator implementation per scheduler instance instead
//! (see `wsched_engine::evaluator`).

use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use wsched_core::job_group::Process;
use wsched_core::ParameterCache;
use wsched_engine::evaluator::PythonEvaluator;
use wsched_engine::trigger::DateModifierFn;

pub type TerminationHandler = Box<dyn Fn(&Process) + Send + Sync>;
/// Shared, not boxed: a fresh [`ParameterCache`] is built per process
/// (§9 "one-way ownership"), and each one installs its own clone of this
/// handler, so it must be cheaply cloneable.
pub type CacheHandlerFn = Arc<dyn Fn(&ParameterCache) + Send + Sync>;
pub type EntityHandlerFn = Arc<dyn Fn(&Value, &HashMap<String, Value>) + Send + Sync>;

pub struct SchedulerConfig {
    pub read_path: PathBuf,
    pub save_path: PathBuf,
    pub session_parameters: HashMap<String, Value>,
    pub date_modifier: Option<DateModifierFn>,
    pub termination_handler: Option<TerminationHandler>,
    pub cache_handler: Option<CacheHandlerFn>,
    pub entity_handler: Option<EntityHandlerFn>,
    pub python_evaluator: Option<Arc<dyn PythonEvaluator>>,
}

impl SchedulerConfig {
    pub fn new(read_path: impl Into<PathBuf>, save_path: impl Into<PathBuf>) -> Self {
        Self {
            read_path: read_path.into(),
            save_path: save_path.into(),
            session_parameters: HashMap::new(),
            date_modifier: None,
            termination_handler: None,
            cache_handler: None,
            entity_handler: None,
            python_evaluator: None,
        }
    }

    wsched_core::setters! {
        set {
            session_parameters: HashMap<String, Value>,
        }
    }

    pub fn with_date_modifier(
        mut self,
        modifier: impl Fn(chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> + Send + Sync + 'static,
    ) -> Self {
        self.date_modifier = Some(Arc::new(modifier));
        self
    }

    pub fn with_termination_handler(mut self, handler: impl Fn(&Process) + Send + Sync + 'static) -> Self {
        self.termination_handler = Some(Box::new(handler));
        self
    }

    pub fn with_cache_handler(mut self, handler: impl Fn(&ParameterCache) + Send + Sync + 'static) -> Self {
        self.cache_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_entity_handler(
        mut self,
        handler: impl Fn(&Value, &HashMap<String, Value>) + Send + Sync + 'static,
    ) -> Self {
        self.entity_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_python_evaluator(mut self, evaluator: Arc<dyn PythonEvaluator>) -> Self {
        self.python_evaluator = Some(evaluator);
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
