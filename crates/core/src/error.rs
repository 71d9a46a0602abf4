// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy (spec §7).

use crate::id::EntityId;
use thiserror::Error;

/// Errors raised by the entity model, parameter cache, and factory.
///
/// Each variant corresponds to one category from the error-handling design:
/// `Config`/`Access` are recoverable at the scheduler-loop level (the
/// offending file is skipped and retried next tick); `InvalidStatus` is
/// fatal within the entity it occurred on; `ParameterMissing` and
/// `EvaluatorFailure` are captured as job return codes and routed through
/// the exception-handling policy; `DeadlineExceeded` drives forced
/// termination; `BadId` surfaces a cache tree invariant violation.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("config error: {0}")]
    Config(String),

    #[error("access error: {0}")]
    Access(String),

    #[error("invalid status transition for {entity_id}: {reason}")]
    InvalidStatus { entity_id: EntityId, reason: String },

    #[error("missing parameter '{key}' for {entity_id}")]
    ParameterMissing { entity_id: EntityId, key: String },

    #[error("evaluator failure for {entity_id}: {message}")]
    EvaluatorFailure { entity_id: EntityId, code: i32, message: String },

    #[error("{entity_id} exceeded its deadline")]
    DeadlineExceeded { entity_id: EntityId },

    #[error("trigger task for '{file}' failed: {message}")]
    TriggerTaskException { file: String, message: String },

    #[error("bad id '{0}': parent node is not present in the cache")]
    BadId(EntityId),

    #[error("unrecognized object type: {0}")]
    UnknownObjectType(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
