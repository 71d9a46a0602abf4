// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use wsched_core::entity::ExceptionHandling;
use wsched_core::job::JobConfig;
use wsched_core::FakeClock;

fn cache_for(root: &EntityId) -> ParameterCache {
    ParameterCache::new(root.clone(), std::collections::HashMap::new())
}

fn cmd_job(id: &str, command: &str) -> Job {
    Job::new(JobConfig::builder("job", EntityId::new(id), command, RunType::Cmd).build())
}

#[tokio::test]
async fn execute_job_reports_success_return_code() {
    let id = EntityId::new("S-1.P-1.JG-1.J-1");
    let mut cache = cache_for(&id);
    let mut job = cmd_job(id.as_str(), "true");
    let evaluator = Evaluator::new();
    let clock = FakeClock::new();

    let code = execute_job(&mut job, &mut cache, &evaluator, clock.now(), None).await.unwrap();
    assert_eq!(code, Status::Finished.code());
}

#[tokio::test]
async fn execute_job_missing_parameter_yields_unsuccessful() {
    let id = EntityId::new("S-1.P-1.JG-1.J-1");
    let mut cache = cache_for(&id);
    let mut job = cmd_job(id.as_str(), "echo #name#");
    let evaluator = Evaluator::new();
    let clock = FakeClock::new();

    let code = execute_job(&mut job, &mut cache, &evaluator, clock.now(), None).await.unwrap();
    assert_eq!(code, Status::Unsuccessful.code());
    assert!(job.message.contains("missing parameter"));
}

#[tokio::test]
async fn execute_job_group_runs_dependents_after_predecessor_finishes() {
    let group_id = EntityId::new("S-1.P-1.JG-1");
    let mut cache = cache_for(&group_id);
    let mut group = JobGroup::new("group", group_id.clone());

    let job1_id = EntityId::new("S-1.P-1.JG-1.J-1");
    let job2_id = EntityId::new("S-1.P-1.JG-1.J-2");
    cache.set_child(job1_id.clone()).unwrap();
    cache.set_child(job2_id.clone()).unwrap();

    let job1 = Job::new(JobConfig::builder("first", job1_id.clone(), "true", RunType::Cmd).build());
    let mut job2 = Job::new(JobConfig::builder("second", job2_id.clone(), "true", RunType::Cmd).build());
    job2.meta.add_dependency("first", Some(job1_id.clone()));

    group.add_entity(Entity::Job(job1));
    group.add_entity(Entity::Job(job2));

    let evaluator = Evaluator::new();
    let clock = FakeClock::new();
    let code = execute_job_group(&mut group, &mut cache, &evaluator, &clock, None).await.unwrap();

    assert_eq!(code, Status::Finished.code());
    assert!(group.is_complete());
}

#[tokio::test]
async fn execute_job_group_propagates_failure_code_from_child() {
    let group_id = EntityId::new("S-1.P-1.JG-2");
    let mut cache = cache_for(&group_id);
    let mut group = JobGroup::new("group", group_id.clone());

    let job_id = EntityId::new("S-1.P-1.JG-2.J-1");
    cache.set_child(job_id.clone()).unwrap();
    let config = JobConfig::builder("doomed", job_id.clone(), "false", RunType::Cmd)
        .exception_handling(ExceptionHandling::Kill)
        .build();
    group.add_entity(Entity::Job(Job::new(config)));

    let evaluator = Evaluator::new();
    let clock = FakeClock::new();
    let code = execute_job_group(&mut group, &mut cache, &evaluator, &clock, None).await.unwrap();

    assert_eq!(code, Status::Failure.code());
}

#[tokio::test]
async fn execute_process_runs_to_completion() {
    let process_id = EntityId::new("S-1.P-1");
    let mut cache = cache_for(&process_id);
    let mut process = Process::new("proc", process_id.clone());

    let job_id = EntityId::new("S-1.P-1.J-1");
    cache.set_child(job_id.clone()).unwrap();
    process
        .group
        .add_entity(Entity::Job(Job::new(JobConfig::builder("only", job_id, "true", RunType::Cmd).build())));

    let evaluator = Evaluator::new();
    let clock = FakeClock::new();
    let code = execute_process(&mut process, &mut cache, &evaluator, &clock).await.unwrap();

    assert_eq!(code, Status::Finished.code());
}

#[test]
fn terminate_process_forces_failure_cascade() {
    let process_id = EntityId::new("S-1.P-2");
    let mut cache = cache_for(&process_id);
    let mut process = Process::new("proc", process_id.clone());

    let job_id = EntityId::new("S-1.P-2.J-1");
    cache.set_child(job_id.clone()).unwrap();
    process.group.add_entity(Entity::Job(Job::new(JobConfig::builder(
        "only",
        job_id.clone(),
        "true",
        RunType::Cmd,
    )
    .build())));

    terminate_process(&mut process, &mut cache, std::time::Instant::now());

    assert_eq!(process.meta().status, Status::Failure);
    match process.group.get_entities().get(&job_id).unwrap() {
        Entity::Job(job) => assert_eq!(job.meta.status, Status::Failure),
        other => panic!("expected a job, got {other:?}"),
    }
}

#[tokio::test]
async fn failure_code_reports_highest_child_code() {
    let process_id = EntityId::new("S-1.P-3");
    let mut cache = cache_for(&process_id);
    let mut process = Process::new("proc", process_id.clone());

    let job_id = EntityId::new("S-1.P-3.J-1");
    cache.set_child(job_id.clone()).unwrap();
    let config = JobConfig::builder("doomed", job_id, "false", RunType::Cmd)
        .exception_handling(ExceptionHandling::Kill)
        .build();
    process.group.add_entity(Entity::Job(Job::new(config)));

    let evaluator = Evaluator::new();
    let clock = FakeClock::new();
    let code = execute_process(&mut process, &mut cache, &evaluator, &clock).await.unwrap();

    assert_eq!(code, Status::Failure.code());
    assert_eq!(failure_code(&process), Status::Failure.code());
}
