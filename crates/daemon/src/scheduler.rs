// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler loop (§4.7): directory polling, trigger arming, condition
//! checks, and concurrent process execution.
//!
//! Grounded on the original `LocalScheduler.run`'s three-phase tick
//! (file check / condition check / execute), adapted to Tokio: each
//! admitted process gets its own [`ParameterCache`] scoped to its own
//! subtree rather than sharing one scheduler-wide cache, so concurrently
//! spawned processes never contend for the same lock (§5 "implementers on
//! a multithreaded runtime must serialize cache mutations per-entity-id" —
//! giving each process a disjoint cache subtree is a stronger form of that
//! serialization). `session_parameters` are copied into each process
//! cache's root layer so ancestor lookups still see them.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use wsched_core::{Clock, EntityId, ParameterCache, Process, SchedulerError, Status, SystemClock};
use wsched_engine::{
    check_conditions, execute_process, log_trigger_task_panic, spawn_trigger, terminate_process,
    validate_process_document, EntityDocument, EntityFactory, Evaluator, TriggerCallback,
    TriggerFactory,
};
use wsched_storage::{read_snapshot, write_snapshot, Snapshot, SnapshotError};

use crate::config::{CacheHandlerFn, EntityHandlerFn, SchedulerConfig, TerminationHandler};

const TICK_INTERVAL: Duration = Duration::from_secs(3);
const UNSUCCESSFUL_RETRY_DELAY: Duration = Duration::from_secs(60);

struct TrackedConfig {
    document: EntityDocument,
    modified: SystemTime,
    trigger_task: Option<JoinHandle<()>>,
}

/// A process admitted to the run queue: either waiting for its turn to
/// (re-)dispatch, or already running as its own task.
enum RunSlot {
    Queued(Process, ParameterCache),
    Running(JoinHandle<(Process, ParameterCache, Result<i32, SchedulerError>)>),
}

#[derive(Serialize, Deserialize)]
struct PersistedConfig {
    document: EntityDocument,
    modified_epoch_ms: u128,
}

#[derive(Serialize, Deserialize)]
struct PersistedInstance {
    process: Process,
    cache: ParameterCache,
}

/// Everything the scheduler serializes (§6 "Persistence"). Handlers and
/// the evaluator are process-local behavior, not data, so they are not
/// part of this shape — a loaded scheduler gets them re-supplied by the
/// [`SchedulerConfig`] passed to [`Scheduler::load_state`]. Processes
/// already mid-execution (an independent spawned task) cannot be
/// captured mid-flight either; only queued (not yet dispatched, or
/// waiting out an unsuccessful retry) processes persist.
#[derive(Serialize, Deserialize)]
struct SchedulerState {
    scheduler_root: EntityId,
    session_parameters: HashMap<String, Value>,
    process_configs: HashMap<String, PersistedConfig>,
    initiated: Vec<PersistedInstance>,
    run_queue: Vec<PersistedInstance>,
    ended_processes: Vec<Process>,
}

/// The scheduler loop (§3 "Process", §4.7). Generic over [`Clock`] so
/// tests can drive it with [`wsched_core::FakeClock`]; production code
/// uses the default [`SystemClock`].
pub struct Scheduler<C: Clock = SystemClock> {
    scheduler_root: EntityId,
    clock: C,
    read_path: PathBuf,
    save_path: PathBuf,
    session_parameters: HashMap<String, Value>,
    date_modifier: Option<wsched_engine::DateModifierFn>,
    termination_handler: Option<TerminationHandler>,
    cache_handler: Option<CacheHandlerFn>,
    entity_handler: Option<EntityHandlerFn>,
    evaluator: Evaluator,
    process_configs: HashMap<String, TrackedConfig>,
    trigger_tx: mpsc::UnboundedSender<EntityDocument>,
    trigger_rx: mpsc::UnboundedReceiver<EntityDocument>,
    initiated: Vec<(Process, ParameterCache)>,
    run_queue: Vec<RunSlot>,
    ended_processes: Vec<Process>,
}

impl Scheduler<SystemClock> {
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Reconstruct a scheduler from a snapshot written by [`Scheduler::save_state`].
    /// `config` re-supplies the handlers and evaluator a snapshot cannot
    /// carry (§9 "callables serialize to null").
    pub fn load_state(path: &Path, config: SchedulerConfig) -> Result<Self, SnapshotError> {
        Self::load_state_with_clock(path, config, SystemClock)
    }
}

impl<C: Clock + 'static> Scheduler<C> {
    pub fn with_clock(config: SchedulerConfig, clock: C) -> Self {
        let scheduler_root = scheduler_root_id(&clock);
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let evaluator = match config.python_evaluator.clone() {
            Some(py) => Evaluator::new().with_python_evaluator(py),
            None => Evaluator::new(),
        };
        Self {
            scheduler_root,
            clock,
            read_path: config.read_path,
            save_path: config.save_path,
            session_parameters: config.session_parameters,
            date_modifier: config.date_modifier,
            termination_handler: config.termination_handler,
            cache_handler: config.cache_handler,
            entity_handler: config.entity_handler,
            evaluator,
            process_configs: HashMap::new(),
            trigger_tx,
            trigger_rx,
            initiated: Vec::new(),
            run_queue: Vec::new(),
            ended_processes: Vec::new(),
        }
    }

    pub fn load_state_with_clock(path: &Path, config: SchedulerConfig, clock: C) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot<SchedulerState> = read_snapshot(path)?;
        let state = snapshot.state;
        let mut scheduler = Self::with_clock(config, clock);
        scheduler.scheduler_root = state.scheduler_root;
        scheduler.session_parameters = state.session_parameters;

        for (file_name, persisted) in state.process_configs {
            scheduler.process_configs.insert(
                file_name,
                TrackedConfig {
                    document: persisted.document,
                    modified: UNIX_EPOCH + Duration::from_millis(persisted.modified_epoch_ms as u64),
                    trigger_task: None,
                },
            );
        }
        scheduler.initiated = state.initiated.into_iter().map(|i| (i.process, i.cache)).collect();
        scheduler.run_queue =
            state.run_queue.into_iter().map(|i| RunSlot::Queued(i.process, i.cache)).collect();
        scheduler.ended_processes = state.ended_processes;

        info!(path = %path.display(), "loaded scheduler snapshot");
        Ok(scheduler)
    }

    pub fn set_date_modifier(
        &mut self,
        modifier: impl Fn(chrono::DateTime<Utc>) -> chrono::DateTime<Utc> + Send + Sync + 'static,
    ) {
        self.date_modifier = Some(std::sync::Arc::new(modifier));
    }

    pub fn set_termination_handler(&mut self, handler: impl Fn(&Process) + Send + Sync + 'static) {
        self.termination_handler = Some(Box::new(handler));
    }

    pub fn ended_processes(&self) -> &[Process] {
        &self.ended_processes
    }

    pub fn scheduler_root(&self) -> &EntityId {
        &self.scheduler_root
    }

    /// Run forever, ticking every [`TICK_INTERVAL`] (§4.7 "every ~3 seconds").
    pub async fn run(&mut self) {
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// One scheduler-loop iteration: file check, condition check, execute
    /// (§4.7).
    pub async fn tick(&mut self) {
        self.file_check().await;
        self.drain_triggered();
        self.condition_check().await;
        self.execute_tick().await;
    }

    fn new_process_cache(&self) -> ParameterCache {
        let mut cache = ParameterCache::new(self.scheduler_root.clone(), self.session_parameters.clone());
        if let Some(handler) = self.cache_handler.clone() {
            cache.set_cache_handler(move |c| handler(c));
        }
        if let Some(handler) = self.entity_handler.clone() {
            cache.set_entity_handler(move |meta, params| handler(meta, params));
        }
        cache
    }

    /// §4.7 step 1. List `read_path`, (re-)arm triggers for new or
    /// modified files, and poll known trigger tasks for a crash.
    async fn file_check(&mut self) {
        let entries = match std::fs::read_dir(&self.read_path) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(path = %self.read_path.display(), %error, "cannot list read_path");
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(error) => {
                    warn!(%error, "directory entry unreadable");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };

            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(m) => m,
                Err(error) => {
                    warn!(file = %file_name, %error, "cannot stat file");
                    continue;
                }
            };

            let unchanged = self.process_configs.get(&file_name).is_some_and(|tracked| tracked.modified == modified);
            if unchanged {
                continue;
            }

            self.admit_file(&file_name, &path, modified);
        }

        for (file_name, tracked) in &mut self.process_configs {
            let finished = tracked.trigger_task.as_ref().is_some_and(JoinHandle::is_finished);
            if !finished {
                continue;
            }
            if let Some(task) = tracked.trigger_task.take() {
                if let Err(join_error) = task.await {
                    log_trigger_task_panic(file_name, &join_error);
                }
            }
        }
    }

    fn admit_file(&mut self, file_name: &str, path: &Path, modified: SystemTime) {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(file = file_name, %error, "cannot read file");
                return;
            }
        };
        let json: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(error) => {
                warn!(file = file_name, %error, "invalid JSON, file skipped");
                return;
            }
        };
        if let Err(error) = validate_process_document(&json) {
            warn!(file = file_name, %error, "process document failed schema validation");
            return;
        }
        let document: EntityDocument = match serde_json::from_value(json) {
            Ok(d) => d,
            Err(error) => {
                warn!(file = file_name, %error, "cannot decode process document");
                return;
            }
        };
        let Some(trigger_doc) = document.trigger.clone() else {
            warn!(file = file_name, "process document has no Trigger, skipped");
            return;
        };

        if let Some(mut previous) = self.process_configs.remove(file_name) {
            if let Some(task) = previous.trigger_task.take() {
                task.abort();
            }
        }

        let tx = self.trigger_tx.clone();
        let doc_for_trigger = document.clone();
        let callback: TriggerCallback = std::sync::Arc::new(move || {
            let _ = tx.send(doc_for_trigger.clone());
        });
        let trigger = match TriggerFactory::create_trigger(&trigger_doc, callback, self.date_modifier.clone()) {
            Ok(t) => t,
            Err(error) => {
                warn!(file = file_name, %error, "cannot build trigger");
                return;
            }
        };
        let trigger_task = spawn_trigger(trigger);

        info!(file = file_name, "process config armed");
        self.process_configs
            .insert(file_name.to_string(), TrackedConfig { document, modified, trigger_task: Some(trigger_task) });
    }

    /// Build a fresh process entity for every document a trigger fired
    /// since the last tick (§4.7 `trigger_callback`).
    fn drain_triggered(&mut self) {
        while let Ok(document) = self.trigger_rx.try_recv() {
            let mut cache = self.new_process_cache();
            match EntityFactory::parse_process(&self.scheduler_root, &document, &mut cache) {
                Ok(process) => self.initiated.push((process, cache)),
                Err(error) => warn!(%error, "failed to build process from trigger"),
            }
        }
    }

    /// §4.7 step 2.
    async fn condition_check(&mut self) {
        let pending = std::mem::take(&mut self.initiated);
        let mut still_initiated = Vec::with_capacity(pending.len());
        for (process, cache) in pending {
            let params = cache.get_parameters(process.entity_id(), true);
            match check_conditions(&process.conditions, &self.evaluator, &params).await {
                Ok(true) => self.run_queue.push(RunSlot::Queued(process, cache)),
                Ok(false) => still_initiated.push((process, cache)),
                Err(error) => {
                    warn!(%error, entity_id = %process.entity_id(), "condition evaluation failed, retrying next tick");
                    still_initiated.push((process, cache));
                }
            }
        }
        self.initiated = still_initiated;
    }

    /// §4.7 step 3.
    async fn execute_tick(&mut self) {
        let slots = std::mem::take(&mut self.run_queue);
        let mut still_running = Vec::with_capacity(slots.len());
        let mut finished = Vec::new();
        let now = self.clock.now();

        for slot in slots {
            match slot {
                RunSlot::Running(handle) => {
                    if handle.is_finished() {
                        match handle.await {
                            Ok((process, cache, Ok(_code))) => finished.push((process, cache)),
                            Ok((process, cache, Err(error))) => {
                                warn!(%error, entity_id = %process.entity_id(), "process execution returned an error");
                                finished.push((process, cache));
                            }
                            Err(join_error) => {
                                warn!(%join_error, "process execution task panicked, process lost");
                            }
                        }
                    } else {
                        still_running.push(RunSlot::Running(handle));
                    }
                }
                RunSlot::Queued(mut process, mut cache) => {
                    let deadline = process.meta().deadline;
                    if deadline.is_some_and(|d| now >= d) {
                        terminate_process(&mut process, &mut cache, now);
                        finished.push((process, cache));
                        continue;
                    }

                    self.save_state_best_effort();

                    let evaluator = self.evaluator.clone();
                    let clock = self.clock.clone();
                    let retry_delay = if process.meta().status == Status::Unsuccessful {
                        Some(UNSUCCESSFUL_RETRY_DELAY)
                    } else {
                        None
                    };
                    let handle = tokio::spawn(async move {
                        if let Some(delay) = retry_delay {
                            tokio::time::sleep(delay).await;
                        }
                        let result = execute_process(&mut process, &mut cache, &evaluator, &clock).await;
                        (process, cache, result)
                    });
                    still_running.push(RunSlot::Running(handle));
                }
            }
        }

        self.run_queue = still_running;

        for (mut process, mut cache) in finished {
            let status = process.meta().status;
            if !status.is_terminal() {
                terminate_process(&mut process, &mut cache, self.clock.now());
            }
            info!(entity_id = %process.entity_id(), status = %process.meta().status, "process terminated");
            if let Some(handler) = &self.termination_handler {
                handler(&process);
            }
            self.ended_processes.push(process);
        }
    }

    fn save_state_best_effort(&self) {
        if let Err(error) = self.save_state() {
            warn!(%error, "failed to persist scheduler snapshot");
        }
    }

    /// §6 "Persistence" / §4.7 "launch snapshots scheduler state before
    /// running". Processes currently executing as their own task are not
    /// captured; only queued ones are.
    pub fn save_state(&self) -> Result<(), SnapshotError> {
        let running_skipped = self.run_queue.iter().filter(|s| matches!(s, RunSlot::Running(_))).count();
        if running_skipped > 0 {
            info!(running_skipped, "snapshot omits in-flight process executions");
        }

        let state = SchedulerState {
            scheduler_root: self.scheduler_root.clone(),
            session_parameters: self.session_parameters.clone(),
            process_configs: self
                .process_configs
                .iter()
                .map(|(file_name, tracked)| {
                    let modified_epoch_ms =
                        tracked.modified.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
                    (file_name.clone(), PersistedConfig { document: tracked.document.clone(), modified_epoch_ms })
                })
                .collect(),
            initiated: self
                .initiated
                .iter()
                .map(|(process, cache)| PersistedInstance { process: process.clone(), cache: cache.clone() })
                .collect(),
            run_queue: self
                .run_queue
                .iter()
                .filter_map(|slot| match slot {
                    RunSlot::Queued(process, cache) => {
                        Some(PersistedInstance { process: process.clone(), cache: cache.clone() })
                    }
                    RunSlot::Running(_) => None,
                })
                .collect(),
            ended_processes: self.ended_processes.clone(),
        };

        let snapshot = Snapshot::new(state, Utc::now());
        write_snapshot(&self.save_path, &snapshot)
    }
}

/// `S-<timestamp>`, exactly as the original's `"S-{:%Y%m%d%H%M%S}"`
/// (SPEC_FULL §F.6).
fn scheduler_root_id<C: Clock>(clock: &C) -> EntityId {
    let millis = i64::try_from(clock.epoch_ms()).unwrap_or(i64::MAX);
    let dt = chrono::DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_else(Utc::now);
    EntityId::new(format!("S-{}", dt.format("%Y%m%d%H%M%S")))
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
