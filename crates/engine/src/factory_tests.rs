// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use std::collections::HashMap;
use wsched_core::entity::Entity;
use wsched_core::ParameterCache;

fn doc(value: serde_json::Value) -> EntityDocument {
    serde_json::from_value(value).expect("valid document fixture")
}

fn root_cache() -> (EntityId, ParameterCache) {
    let root = EntityId::new("S-1");
    (root.clone(), ParameterCache::new(root, HashMap::new()))
}

fn linear_process() -> serde_json::Value {
    json!({
        "Object Type": "Process",
        "Name": "daily",
        "Entity List": [
            {
                "Object Type": "Job",
                "Name": "A",
                "Run Type": "cmd",
                "Command": "true",
            },
            {
                "Object Type": "Job",
                "Name": "B",
                "Run Type": "cmd",
                "Command": "true",
                "Dependencies": ["A"],
            },
        ],
    })
}

#[test]
fn process_id_is_child_of_scheduler_root() {
    let (root, mut cache) = root_cache();
    let process = EntityFactory::parse_process(&root, &doc(linear_process()), &mut cache).unwrap();
    assert_eq!(process.entity_id().as_str(), "S-1.P-1");
}

#[test]
fn child_ids_are_unique_and_prefixed_by_parent() {
    let (root, mut cache) = root_cache();
    let process = EntityFactory::parse_process(&root, &doc(linear_process()), &mut cache).unwrap();
    let ids: Vec<&str> = process.group.get_entity_ids().map(|id| id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    for id in &ids {
        assert!(id.starts_with("S-1.P-1.J-"));
    }
    assert_ne!(ids[0], ids[1]);
}

#[test]
fn dependency_name_resolves_to_sibling_id() {
    let (root, mut cache) = root_cache();
    let process = EntityFactory::parse_process(&root, &doc(linear_process()), &mut cache).unwrap();
    let entities = process.group.get_entities();
    let b = entities.values().find(|e| e.meta().name == "B").unwrap();
    let resolved: Vec<&EntityId> = b.meta().dependency_ids().collect();
    assert_eq!(resolved.len(), 1);
    let a_id = entities.values().find(|e| e.meta().name == "A").unwrap().entity_id();
    assert_eq!(resolved[0], a_id);
}

#[test]
fn unresolved_dependency_name_is_dropped_not_fatal() {
    let (root, mut cache) = root_cache();
    let document = doc(json!({
        "Object Type": "Process",
        "Name": "p",
        "Entity List": [
            {
                "Object Type": "Job",
                "Name": "A",
                "Run Type": "cmd",
                "Command": "true",
                "Dependencies": ["nonexistent"],
            },
        ],
    }));
    let process = EntityFactory::parse_process(&root, &document, &mut cache).unwrap();
    let a = process.group.get_entities().values().next().unwrap();
    assert_eq!(a.meta().dependency_ids().count(), 0);
}

#[test]
fn unknown_object_type_is_an_error() {
    let (root, mut cache) = root_cache();
    let document = doc(json!({"Object Type": "Workflow", "Name": "x"}));
    let err = EntityFactory::parse_process(&root, &document, &mut cache).unwrap_err();
    assert!(matches!(err, FactoryError::UnknownObjectType(_)));
}

#[test]
fn unknown_run_type_is_an_error() {
    let (root, mut cache) = root_cache();
    let document = doc(json!({
        "Object Type": "Process",
        "Name": "p",
        "Entity List": [
            {"Object Type": "Job", "Name": "A", "Run Type": "java", "Command": "true"},
        ],
    }));
    let err = EntityFactory::parse_process(&root, &document, &mut cache).unwrap_err();
    assert!(matches!(err, FactoryError::UnknownRunType(_)));
}

#[test]
fn deadline_offset_is_parsed_from_hhmmss() {
    let (root, mut cache) = root_cache();
    let document = doc(json!({
        "Object Type": "Process",
        "Name": "p",
        "Deadline": "01:02:03",
        "Entity List": [],
    }));
    let process = EntityFactory::parse_process(&root, &document, &mut cache).unwrap();
    let offset = process.meta().deadline_offset.unwrap();
    assert_eq!(offset.as_secs(), 3723);
}

#[test]
fn jobgroup_nests_into_own_dag() {
    let (root, mut cache) = root_cache();
    let document = doc(json!({
        "Object Type": "Process",
        "Name": "p",
        "Entity List": [
            {
                "Object Type": "JobGroup",
                "Name": "inner",
                "Jobs": [
                    {"Object Type": "Job", "Name": "A", "Run Type": "cmd", "Command": "true"},
                ],
            },
        ],
    }));
    let process = EntityFactory::parse_process(&root, &document, &mut cache).unwrap();
    let group = process.group.get_entities().values().next().unwrap();
    match group {
        Entity::JobGroup(g) => assert_eq!(g.get_entities().len(), 1),
        _ => panic!("expected a job group"),
    }
}

fn noop_callback() -> TriggerCallback {
    std::sync::Arc::new(|| {})
}

#[test]
fn trigger_factory_defaults_modifier_action_to_keep() {
    let document = TriggerDocument {
        trigger_type: "cron".to_string(),
        cron_expression: Some("0 0 * * * *".to_string()),
        trigger_time: None,
        modifier_action: None,
    };
    let trigger = TriggerFactory::create_trigger(&document, noop_callback(), None).unwrap();
    assert_eq!(trigger.kind(), crate::trigger::TriggerKind::Cron);
}

#[test]
fn trigger_factory_builds_datetime_trigger() {
    let document = TriggerDocument {
        trigger_type: "datetime".to_string(),
        cron_expression: None,
        trigger_time: Some(chrono::Utc::now()),
        modifier_action: Some("unmodify".to_string()),
    };
    let trigger = TriggerFactory::create_trigger(&document, noop_callback(), None).unwrap();
    assert_eq!(trigger.kind(), crate::trigger::TriggerKind::Date);
}

#[test]
fn trigger_factory_rejects_unknown_trigger_type() {
    let document = TriggerDocument {
        trigger_type: "weekly".to_string(),
        cron_expression: None,
        trigger_time: None,
        modifier_action: None,
    };
    let err = TriggerFactory::create_trigger(&document, noop_callback(), None).unwrap_err();
    assert!(matches!(err, FactoryError::UnknownTriggerType(_)));
}
