// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wsched-engine: evaluators, the trigger subsystem, and the entity/trigger
//! factories that turn a process definition document into a live `Process`.

pub mod conditions;
pub mod document;
pub mod evaluator;
pub mod exec;
pub mod factory;
pub mod schema;
pub mod trigger;

pub use conditions::{check_conditions, evaluate_condition};
pub use document::{EntityDocument, TriggerDocument};
pub use evaluator::{CmdEvaluator, Evaluator, EvaluatorError, PythonEvaluator};
pub use exec::{execute_entity, execute_job, execute_job_group, execute_process, failure_code, terminate_process};
pub use factory::{EntityFactory, FactoryError, TriggerFactory};
pub use schema::validate_process_document;
pub use trigger::{
    log_trigger_task_panic, spawn as spawn_trigger, DateModifierFn, DateModifierPolicy, Trigger,
    TriggerCallback, TriggerKind,
};
