// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job dispatch (§4.3, §9 design note on evaluator pluggability).
//!
//! The original scheduler loads a Python module off disk with
//! `importlib` and calls a named function in it for `run_type: python`
//! jobs. There is no Rust equivalent to dynamically loading and calling
//! into an interpreted module, so `python` jobs are instead dispatched to
//! a [`PythonEvaluator`] trait object supplied by the host process — the
//! same shape FFI/plugin hosts use elsewhere, and it keeps the
//! "pluggable evaluator" property the original had (arbitrary host code
//! runs with the job's resolved parameters and cache reference) without
//! inventing a module loader.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use wsched_core::job::{Invocation, JobParameters};

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("failed to spawn command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("evaluation timed out after {0:?}")]
    Timeout(Duration),
    #[error("python evaluator is not registered for this scheduler")]
    NoPythonEvaluator,
}

/// Dispatches a `run_type: cmd` invocation to a subprocess via a shell
/// (§4.3, grounded on the original's `cmd_evaluator`).
#[derive(Debug, Clone, Default)]
pub struct CmdEvaluator;

impl CmdEvaluator {
    pub async fn evaluate(
        &self,
        command: &str,
        flat_arguments: &str,
        timeout: Option<Duration>,
    ) -> Result<(i32, String), EvaluatorError> {
        let cmd_string = format!("{command} {flat_arguments}");
        let child = Command::new("sh")
            .arg("-c")
            .arg(&cmd_string)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let output = match timeout {
            Some(d) => tokio::time::timeout(d, child.wait_with_output())
                .await
                .map_err(|_| EvaluatorError::Timeout(d))??,
            None => child.wait_with_output().await?,
        };

        let mut logging_info = String::new();
        logging_info.push_str(&String::from_utf8_lossy(&output.stdout));
        logging_info.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok((output.status.code().unwrap_or(-1), logging_info))
    }
}

/// Host-supplied evaluator for `run_type: python` jobs. The host registers
/// one implementation per scheduler; the engine invokes it with the
/// resolved module path, function name, declared arguments, and the
/// flattened parameter map the cache produced for this job.
#[async_trait]
pub trait PythonEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        module: &str,
        function: &str,
        arguments: &JobParameters,
        params: &HashMap<String, Value>,
        timeout: Option<Duration>,
    ) -> Result<(i32, String), EvaluatorError>;
}

/// Combines the built-in command evaluator with an optional
/// host-registered Python evaluator and picks between them by run type.
#[derive(Clone)]
pub struct Evaluator {
    cmd: CmdEvaluator,
    python: Option<Arc<dyn PythonEvaluator>>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self { cmd: CmdEvaluator, python: None }
    }

    pub fn with_python_evaluator(mut self, evaluator: Arc<dyn PythonEvaluator>) -> Self {
        self.python = Some(evaluator);
        self
    }

    pub async fn run_cmd(
        &self,
        invocation: &Invocation,
        timeout: Option<Duration>,
    ) -> Result<(i32, String), EvaluatorError> {
        self.cmd.evaluate(&invocation.command, &invocation.flat_arguments, timeout).await
    }

    pub async fn run_python(
        &self,
        invocation: &Invocation,
        params: &HashMap<String, Value>,
        timeout: Option<Duration>,
    ) -> Result<(i32, String), EvaluatorError> {
        let module = invocation.module.as_deref().unwrap_or_default();
        match &self.python {
            Some(evaluator) => {
                evaluator
                    .evaluate(module, &invocation.command, &invocation.arguments, params, timeout)
                    .await
            }
            None => Err(EvaluatorError::NoPythonEvaluator),
        }
    }
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;
