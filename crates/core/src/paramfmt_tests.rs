// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::job::JobParameters;
use serde_json::json;

fn id() -> EntityId {
    EntityId::new("S-1.P-1.JG-1.J-1")
}

#[test]
fn fill_string_replaces_single_placeholder() {
    let mut params = HashMap::new();
    params.insert("name".to_string(), json!("world"));
    let out = fill_string(&id(), "hello #name#", &params).unwrap();
    assert_eq!(out, "hello world");
}

#[test]
fn fill_string_replaces_multiple_placeholders() {
    let mut params = HashMap::new();
    params.insert("a".to_string(), json!("1"));
    params.insert("b".to_string(), json!("2"));
    let out = fill_string(&id(), "#a#-#b#", &params).unwrap();
    assert_eq!(out, "1-2");
}

#[test]
fn fill_string_missing_key_errors() {
    let params = HashMap::new();
    let err = fill_string(&id(), "#missing#", &params).unwrap_err();
    assert!(matches!(err, SchedulerError::ParameterMissing { .. }));
}

#[test]
fn fill_string_renders_non_string_values_via_json_text() {
    let mut params = HashMap::new();
    params.insert("n".to_string(), json!(42));
    let out = fill_string(&id(), "count=#n#", &params).unwrap();
    assert_eq!(out, "count=42");
}

#[test]
fn parse_arguments_replaces_whole_value_preserving_type() {
    let mut params = HashMap::new();
    params.insert("n".to_string(), json!(42));
    let args = JobParameters::Map(HashMap::from([("count".to_string(), json!("#n#"))]));
    let resolved = parse_arguments(&id(), &args, &params).unwrap();
    match resolved {
        JobParameters::Map(map) => assert_eq!(map["count"], json!(42)),
        _ => panic!("expected map"),
    }
}

#[test]
fn parse_arguments_passes_through_plain_strings() {
    let params = HashMap::new();
    let args = JobParameters::Map(HashMap::from([("literal".to_string(), json!("plain"))]));
    let resolved = parse_arguments(&id(), &args, &params).unwrap();
    match resolved {
        JobParameters::Map(map) => assert_eq!(map["literal"], json!("plain")),
        _ => panic!("expected map"),
    }
}

#[test]
fn parse_arguments_missing_key_errors() {
    let params = HashMap::new();
    let args = JobParameters::List(vec![json!("#missing#")]);
    let err = parse_arguments(&id(), &args, &params).unwrap_err();
    assert!(matches!(err, SchedulerError::ParameterMissing { .. }));
}

#[test]
fn flat_args_formats_map_as_key_value_pairs() {
    let args = JobParameters::Map(HashMap::from([("x".to_string(), json!("1"))]));
    let out = flat_args(&args, "; ");
    assert_eq!(out, "x=\"1\"; ");
}

#[test]
fn flat_args_formats_list_as_quoted_tokens() {
    let args = JobParameters::List(vec![json!("a"), json!("b")]);
    let out = flat_args(&args, " ");
    assert!(out.contains("\"a\""));
    assert!(out.contains("\"b\""));
}
