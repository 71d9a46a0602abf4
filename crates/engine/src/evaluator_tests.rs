// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use wsched_core::job::{Invocation, JobParameters};

fn invocation(command: &str) -> Invocation {
    Invocation {
        command: command.to_string(),
        module: None,
        arguments: JobParameters::Map(HashMap::new()),
        flat_arguments: String::new(),
    }
}

#[tokio::test]
async fn cmd_evaluator_reports_success_return_code() {
    let evaluator = CmdEvaluator;
    let (code, _) = evaluator.evaluate("true", "", None).await.unwrap();
    assert_eq!(code, 0);
}

#[tokio::test]
async fn cmd_evaluator_reports_failure_return_code() {
    let evaluator = CmdEvaluator;
    let (code, _) = evaluator.evaluate("false", "", None).await.unwrap();
    assert_ne!(code, 0);
}

#[tokio::test]
async fn cmd_evaluator_captures_stdout() {
    let evaluator = CmdEvaluator;
    let (_, output) = evaluator.evaluate("echo", "hello", None).await.unwrap();
    assert!(output.contains("hello"));
}

#[tokio::test]
async fn cmd_evaluator_times_out_long_running_commands() {
    let evaluator = CmdEvaluator;
    let err = evaluator
        .evaluate("sleep", "2", Some(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, EvaluatorError::Timeout(_)));
}

struct StubPythonEvaluator;

#[async_trait]
impl PythonEvaluator for StubPythonEvaluator {
    async fn evaluate(
        &self,
        _module: &str,
        _function: &str,
        _arguments: &JobParameters,
        _params: &HashMap<String, Value>,
        _timeout: Option<Duration>,
    ) -> Result<(i32, String), EvaluatorError> {
        Ok((0, "ok".to_string()))
    }
}

#[tokio::test]
async fn evaluator_without_python_registered_errors() {
    let evaluator = Evaluator::new();
    let err = evaluator.run_python(&invocation("f"), &HashMap::new(), None).await.unwrap_err();
    assert!(matches!(err, EvaluatorError::NoPythonEvaluator));
}

#[tokio::test]
async fn evaluator_dispatches_to_registered_python_evaluator() {
    let evaluator = Evaluator::new().with_python_evaluator(Arc::new(StubPythonEvaluator));
    let (code, message) = evaluator.run_python(&invocation("f"), &HashMap::new(), None).await.unwrap();
    assert_eq!(code, 0);
    assert_eq!(message, "ok");
}
