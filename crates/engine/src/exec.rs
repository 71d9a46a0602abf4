// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution orchestration: ties an entity's status machine (core) to the
//! evaluator dispatch and condition checks (engine) — §4.3 "Job Execution"
//! and §4.4 "DAG Execution".
//!
//! This lives in the engine crate rather than core because it needs an
//! [`Evaluator`] to actually run anything; core only owns the state
//! machine and the DAG bookkeeping the functions here drive.

use crate::evaluator::Evaluator;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use wsched_core::entity::{Entity, EntityMeta};
use wsched_core::job::{Job, RunType};
use wsched_core::job_group::{JobGroup, Process};
use wsched_core::{Clock, EntityId, ParameterCache, SchedulerError, Status};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

fn publish_state(cache: &mut ParameterCache, id: &EntityId, meta: &EntityMeta) {
    if let Ok(value) = serde_json::to_value(meta) {
        cache.read_state(id.clone(), value, true);
    }
}

/// Run a single job to completion (§4.3 steps 1-7).
pub async fn execute_job(
    job: &mut Job,
    cache: &mut ParameterCache,
    evaluator: &Evaluator,
    now: Instant,
    inherited_deadline: Option<Instant>,
) -> Result<i32, SchedulerError> {
    job.meta.start(now, inherited_deadline)?;
    publish_state(cache, job.entity_id(), &job.meta);

    let params = cache.get_parameters(job.entity_id(), true);
    let execution_status_code = match job.build_invocation(&params) {
        Ok(invocation) => {
            let timeout = job.meta.timeout;
            let outcome = match job.run_type {
                RunType::Cmd => evaluator.run_cmd(&invocation, timeout).await,
                RunType::Python => evaluator.run_python(&invocation, &params, timeout).await,
            };
            match outcome {
                Ok((code, message)) => {
                    let success = job.record_result(code);
                    job.log(&message, !success);
                    if success {
                        0
                    } else {
                        1
                    }
                }
                Err(evaluator_error) => {
                    job.log(&evaluator_error.to_string(), true);
                    1
                }
            }
        }
        Err(SchedulerError::ParameterMissing { key, .. }) => {
            job.log(&format!("missing parameter '{key}'"), true);
            1
        }
        Err(other) => return Err(other),
    };

    let code = job.meta.end(now, execution_status_code)?;
    publish_state(cache, job.entity_id(), &job.meta);
    Ok(code)
}

/// Run a job-group's DAG to completion, re-sweeping ready entities until
/// every child reaches `finished` or a non-zero code propagates up (§4.4).
pub async fn execute_job_group<C: Clock>(
    group: &mut JobGroup,
    cache: &mut ParameterCache,
    evaluator: &Evaluator,
    clock: &C,
    inherited_deadline: Option<Instant>,
) -> Result<i32, SchedulerError> {
    let first_entry = group.meta.status == Status::Initialized;
    group.meta.start(clock.now(), inherited_deadline)?;
    publish_state(cache, group.entity_id(), &group.meta);
    if first_entry {
        group.generate_graph();
    }
    let ceiling = group.meta.deadline;

    loop {
        if group.is_complete() {
            let code = group.meta.end(clock.now(), 0)?;
            publish_state(cache, group.entity_id(), &group.meta);
            return Ok(code);
        }

        let ready: Vec<EntityId> = group.ready_entities().into_iter().cloned().collect();
        let mut execution_status_code = 0;

        for id in &ready {
            let Some(entity) = group.graph_entities.get_mut(id) else { continue };
            let child_code = execute_entity(entity, cache, evaluator, clock, ceiling).await?;
            if child_code == 0 {
                group.mark_finished(id);
            } else {
                execution_status_code = execution_status_code.max(child_code);
            }
        }

        if ready.is_empty() && !group.is_complete() {
            // No ready entity and the group is not done: every remaining
            // entity is blocked on a predecessor that will never finish.
            // Treat as a stuck group rather than spin forever.
            let code = group.meta.end(clock.now(), 1)?;
            publish_state(cache, group.entity_id(), &group.meta);
            return Ok(code);
        }

        if execution_status_code != 0 {
            let code = group.meta.end(clock.now(), execution_status_code)?;
            publish_state(cache, group.entity_id(), &group.meta);
            return Ok(code);
        }
    }
}

/// Dispatch to [`execute_job`] or [`execute_job_group`] by entity kind.
/// Boxed because job-group execution recurses back into this function for
/// nested job-groups.
pub fn execute_entity<'a, C: Clock + 'a>(
    entity: &'a mut Entity,
    cache: &'a mut ParameterCache,
    evaluator: &'a Evaluator,
    clock: &'a C,
    inherited_deadline: Option<Instant>,
) -> BoxFuture<'a, Result<i32, SchedulerError>> {
    Box::pin(async move {
        match entity {
            Entity::Job(job) => execute_job(job, cache, evaluator, clock.now(), inherited_deadline).await,
            Entity::JobGroup(group) => {
                execute_job_group(group, cache, evaluator, clock, inherited_deadline).await
            }
        }
    })
}

/// Run a process to completion. A process's deadline is its own ceiling —
/// nothing is inherited (§9 note (b)).
pub async fn execute_process<C: Clock>(
    process: &mut Process,
    cache: &mut ParameterCache,
    evaluator: &Evaluator,
    clock: &C,
) -> Result<i32, SchedulerError> {
    execute_job_group(&mut process.group, cache, evaluator, clock, None).await
}

fn publish_tree(cache: &mut ParameterCache, entity: &Entity) {
    publish_state(cache, entity.entity_id(), entity.meta());
    if let Entity::JobGroup(group) = entity {
        for child in group.graph_entities.values() {
            publish_tree(cache, child);
        }
    }
}

/// Force a process and every unfinished descendant into `failure`,
/// publishing the resulting metadata cascade (§4.4 "Termination cascade").
pub fn terminate_process(process: &mut Process, cache: &mut ParameterCache, now: Instant) {
    process.group.terminate(now);
    publish_state(cache, process.entity_id(), process.meta());
    for child in process.group.graph_entities.values() {
        publish_tree(cache, child);
    }
}

/// Highest failure code reached by any entity in `process`, suitable for
/// exit-status reporting once it terminates (§4.4 "max-code propagation").
pub fn failure_code(process: &Process) -> i32 {
    let own = process.meta().status.code().max(0);
    own.max(process.group.max_failure_code())
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
