// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parameter stringification helpers (spec §4.3, §6; grounded on the
//! original `fbpscheduler.parse` module).

use crate::error::SchedulerError;
use crate::id::EntityId;
use crate::job::JobParameters;
use serde_json::Value;
use std::collections::HashMap;

/// Render a JSON value the way a shell argument would expect to see it:
/// strings unquoted, everything else via its JSON text form.
fn value_to_arg_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten a dict or list into a single string for command-line handoff
/// (§6 "Command line flattening"). Dict -> `key="value"{delim}` pairs;
/// list -> `"value"{delim}` tokens.
pub fn flat_args(arguments: &JobParameters, delimiter: &str) -> String {
    let mut out = String::new();
    match arguments {
        JobParameters::Map(map) => {
            for (key, value) in map {
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&value_to_arg_string(value));
                out.push('"');
                out.push_str(delimiter);
            }
        }
        JobParameters::List(list) => {
            for value in list {
                out.push('"');
                out.push_str(&value_to_arg_string(value));
                out.push('"');
                out.push_str(delimiter);
            }
        }
    }
    out
}

/// Convert a parameters dict to a list of `key=value` tokens.
pub fn list_args(arguments: &HashMap<String, Value>) -> Vec<String> {
    arguments
        .iter()
        .map(|(k, v)| format!("{k}={}", value_to_arg_string(v)))
        .collect()
}

/// Substring pattern `#key#` delimiter, matched and replaced left to right.
fn next_placeholder(s: &str) -> Option<(usize, usize, &str)> {
    let start = s.find('#')?;
    let end = s[start + 1..].find('#')? + start + 1;
    Some((start, end + 1, &s[start + 1..end]))
}

/// Fill every `#key#` placeholder in `target` with the textual rendering of
/// `params[key]` (§4.3 step 4, §6 "Parameter placeholder syntax"). Errors
/// with [`SchedulerError::ParameterMissing`] if a referenced key is absent.
pub fn fill_string(
    entity_id: &EntityId,
    target: &str,
    params: &HashMap<String, Value>,
) -> Result<String, SchedulerError> {
    let mut out = target.to_string();
    while let Some((start, end, key)) = next_placeholder(&out) {
        let value = params.get(key).ok_or_else(|| SchedulerError::ParameterMissing {
            entity_id: entity_id.clone(),
            key: key.to_string(),
        })?;
        out.replace_range(start..end, &value_to_arg_string(value));
    }
    Ok(out)
}

/// Produce concrete arguments by scanning the declared parameters (§4.3
/// step 3): any string value containing a `#key#` placeholder is replaced
/// wholesale by `params[key]` (preserving its JSON type); non-string
/// values and strings without a placeholder pass through unchanged.
pub fn parse_arguments(
    entity_id: &EntityId,
    arguments: &JobParameters,
    params: &HashMap<String, Value>,
) -> Result<JobParameters, SchedulerError> {
    let resolve = |value: &Value| -> Result<Value, SchedulerError> {
        match value {
            Value::String(s) => match next_placeholder(s) {
                Some((_, _, key)) => params
                    .get(key)
                    .cloned()
                    .ok_or_else(|| SchedulerError::ParameterMissing {
                        entity_id: entity_id.clone(),
                        key: key.to_string(),
                    }),
                None => Ok(value.clone()),
            },
            other => Ok(other.clone()),
        }
    };

    match arguments {
        JobParameters::Map(map) => {
            let mut out = HashMap::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), resolve(v)?);
            }
            Ok(JobParameters::Map(out))
        }
        JobParameters::List(list) => {
            let mut out = Vec::with_capacity(list.len());
            for v in list {
                out.push(resolve(v)?);
            }
            Ok(JobParameters::List(out))
        }
    }
}

#[cfg(test)]
#[path = "paramfmt_tests.rs"]
mod tests;
