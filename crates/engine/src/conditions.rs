// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Condition predicate evaluation (§3 "conditions", §4.7 "Condition
//! check"; SPEC_FULL §F.2).
//!
//! A condition is a `[module, function]` reference, the same shape a
//! `python` run-type job uses, so it dispatches through the same
//! [`Evaluator`]. The original calls `python_evaluator` directly and
//! treats whatever it returns as truthy; since every other return-code
//! path in this crate treats `0` as success, a condition is truthy iff
//! the evaluator reports a success code.

use crate::evaluator::{Evaluator, EvaluatorError};
use serde_json::Value;
use std::collections::HashMap;
use wsched_core::entity::ConditionRef;
use wsched_core::job::{Invocation, JobParameters};

/// Evaluate a single condition against the entity's resolved parameters.
pub async fn evaluate_condition(
    condition: &ConditionRef,
    evaluator: &Evaluator,
    params: &HashMap<String, Value>,
) -> Result<bool, EvaluatorError> {
    let invocation = Invocation {
        command: condition.function.clone(),
        module: Some(condition.module.clone()),
        arguments: JobParameters::Map(params.clone()),
        flat_arguments: String::new(),
    };
    let (code, _message) = evaluator.run_python(&invocation, params, None).await?;
    Ok(code == 0)
}

/// True iff every condition evaluates truthy (§4.7 "if all its
/// conditions evaluate truthy, move it to run_queue").
pub async fn check_conditions(
    conditions: &[ConditionRef],
    evaluator: &Evaluator,
    params: &HashMap<String, Value>,
) -> Result<bool, EvaluatorError> {
    for condition in conditions {
        if !evaluate_condition(condition, evaluator, params).await? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
#[path = "conditions_tests.rs"]
mod tests;
