// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::entity::Entity;
use crate::job::{Job, JobConfig, RunType};

fn job_entity(id: &str, deps: &[(&str, &str)]) -> Entity {
    let config = JobConfig::builder(id, EntityId::new(id), "echo hi", RunType::Cmd).build();
    let mut job = Job::new(config);
    for (name, dep_id) in deps {
        job.meta.add_dependency(*name, Some(EntityId::new(*dep_id)));
    }
    Entity::Job(job)
}

fn group_with(ids_and_deps: &[(&str, &[(&str, &str)])]) -> JobGroup {
    let mut group = JobGroup::new("g", EntityId::new("S-1.P-1.JG-1"));
    for (id, deps) in ids_and_deps {
        group.add_entity(job_entity(id, deps));
    }
    group.generate_graph();
    group
}

#[test]
fn generate_graph_is_idempotent() {
    let mut group = group_with(&[("a", &[]), ("b", &[("a", "a")])]);
    let before = group.pending.clone();
    group.generate_graph();
    assert_eq!(group.pending, before);
}

#[test]
fn ready_entities_excludes_nodes_with_unfinished_predecessors() {
    let group = group_with(&[("a", &[]), ("b", &[("a", "a")])]);
    let ready: Vec<_> = group.ready_entities();
    assert_eq!(ready, vec![&EntityId::new("a")]);
}

#[test]
fn mark_finished_unblocks_dependents_via_column_clear() {
    let mut group = group_with(&[("a", &[]), ("b", &[("a", "a")])]);
    group.mark_finished(&EntityId::new("a"));
    let ready: Vec<_> = group.ready_entities();
    assert_eq!(ready, vec![&EntityId::new("b")]);
}

#[test]
fn is_complete_requires_every_child_finished() {
    let mut group = group_with(&[("a", &[])]);
    assert!(!group.is_complete());
    if let Some(Entity::Job(job)) = group.graph_entities.get_mut(&EntityId::new("a")) {
        job.meta.status = Status::Finished;
    }
    assert!(group.is_complete());
}

#[test]
fn max_failure_code_ignores_non_positive_status_codes() {
    let mut group = group_with(&[("a", &[]), ("b", &[])]);
    if let Some(Entity::Job(job)) = group.graph_entities.get_mut(&EntityId::new("a")) {
        job.meta.status = Status::Unsuccessful;
    }
    if let Some(Entity::Job(job)) = group.graph_entities.get_mut(&EntityId::new("b")) {
        job.meta.status = Status::Failure;
    }
    assert_eq!(group.max_failure_code(), Status::Failure.code());
}

#[test]
fn terminate_cascades_to_children_and_is_idempotent_once_finished() {
    let mut group = group_with(&[("a", &[])]);
    let now = Instant::now();
    group.terminate(now);
    assert_eq!(group.meta.status, Status::Failure);
    match group.graph_entities.get(&EntityId::new("a")).unwrap() {
        Entity::Job(job) => assert_eq!(job.meta.status, Status::Failure),
        _ => panic!("expected job"),
    }
}

#[test]
fn process_start_arms_own_deadline_with_no_inherited_ceiling() {
    let mut process = Process::new("p", EntityId::new("S-1.P-1"));
    process.group.meta.deadline_offset = Some(std::time::Duration::from_secs(30));
    let now = Instant::now();
    process.start(now).unwrap();
    assert_eq!(process.meta().deadline, Some(now + std::time::Duration::from_secs(30)));
}
