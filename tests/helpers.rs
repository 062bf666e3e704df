//! Test utility functions for stagehand

use stagehand::core::config::PipelineConfig;
use stagehand::core::secret::StaticSecretStore;
use stagehand::core::{Pipeline, RunEvent, RunStatus, RunnerError, Stage, StageState};
use stagehand::execution::{ExecutionEngine, Sandbox, StageOutput};

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Sandbox that records execution order and fails scripted stages
pub struct MockSandbox {
    failing: Vec<String>,
    executed: Arc<Mutex<Vec<String>>>,
    seen_secrets: Arc<Mutex<BTreeMap<String, BTreeMap<String, String>>>>,
}

impl MockSandbox {
    pub fn new() -> Self {
        Self::failing(&[])
    }

    /// Sandbox that fails the named stages with exit code 1
    pub fn failing(stages: &[&str]) -> Self {
        Self {
            failing: stages.iter().map(|s| s.to_string()).collect(),
            executed: Arc::new(Mutex::new(Vec::new())),
            seen_secrets: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn executed(&self) -> Arc<Mutex<Vec<String>>> {
        self.executed.clone()
    }

    pub fn seen_secrets(&self) -> Arc<Mutex<BTreeMap<String, BTreeMap<String, String>>>> {
        self.seen_secrets.clone()
    }
}

#[async_trait]
impl Sandbox for MockSandbox {
    async fn run_stage(
        &self,
        stage: &Stage,
        secrets: &BTreeMap<String, String>,
    ) -> Result<StageOutput, RunnerError> {
        self.executed.lock().unwrap().push(stage.name.clone());
        self.seen_secrets
            .lock()
            .unwrap()
            .insert(stage.name.clone(), secrets.clone());

        if self.failing.contains(&stage.name) {
            Err(RunnerError::Command {
                command: stage.commands.first().cloned().unwrap_or_default(),
                exit_code: 1,
                output: format!("simulated failure in {}", stage.name),
            })
        } else {
            Ok(StageOutput {
                output: format!("ran {}", stage.name),
            })
        }
    }
}

/// Run a pipeline with a mock sandbox, failing the named stages
pub async fn run_pipeline_with_mock(
    pipeline: &mut Pipeline,
    event: RunEvent,
    failing: &[&str],
) -> PipelineTestResult {
    run_pipeline_with_sandbox(pipeline, event, MockSandbox::failing(failing), None).await
}

/// Run a pipeline with any sandbox implementation
pub async fn run_pipeline_with_sandbox<S: Sandbox + 'static>(
    pipeline: &mut Pipeline,
    event: RunEvent,
    sandbox: S,
    secrets: Option<StaticSecretStore>,
) -> PipelineTestResult {
    let start = std::time::Instant::now();
    let engine = ExecutionEngine::new(sandbox, Arc::new(secrets.unwrap_or_default()));
    let status = engine.execute(pipeline, event).await;
    let duration = start.elapsed();

    PipelineTestResult {
        pipeline: pipeline.clone(),
        status,
        duration_ms: duration.as_millis() as u64,
    }
}

/// Test result from running a pipeline
#[derive(Debug, Clone)]
pub struct PipelineTestResult {
    pub pipeline: Pipeline,
    pub status: RunStatus,
    pub duration_ms: u64,
}

impl PipelineTestResult {
    /// Check if the run completed successfully
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Check if the run failed
    pub fn is_failed(&self) -> bool {
        self.status == RunStatus::Failed
    }

    /// Get the output of a completed stage
    pub fn stage_output(&self, name: &str) -> Option<String> {
        self.pipeline.stage(name).and_then(|s| match &s.state {
            StageState::Completed { output, .. } => Some(output.clone()),
            _ => None,
        })
    }

    /// Get the state of a specific stage
    pub fn stage_state(&self, name: &str) -> Option<&StageState> {
        self.pipeline.stage(name).map(|s| &s.state)
    }

    /// Get the error message from a failed stage
    pub fn stage_error(&self, name: &str) -> Option<String> {
        self.pipeline.stage(name).and_then(|s| match &s.state {
            StageState::Failed { error, .. } => Some(error.clone()),
            _ => None,
        })
    }

    /// Get completed stages in document order
    pub fn completed_stages(&self) -> Vec<String> {
        self.pipeline
            .stages
            .iter()
            .filter(|s| matches!(s.state, StageState::Completed { .. }))
            .map(|s| s.name.clone())
            .collect()
    }

    /// Get failed stages
    pub fn failed_stages(&self) -> Vec<String> {
        self.pipeline
            .stages
            .iter()
            .filter(|s| matches!(s.state, StageState::Failed { .. }))
            .map(|s| s.name.clone())
            .collect()
    }

    /// Get skipped stages
    pub fn skipped_stages(&self) -> Vec<String> {
        self.pipeline
            .stages
            .iter()
            .filter(|s| matches!(s.state, StageState::Skipped { .. }))
            .map(|s| s.name.clone())
            .collect()
    }

    /// Get a summary of the result
    pub fn summary(&self) -> String {
        let status = match self.status {
            RunStatus::Completed => "✅ Completed",
            RunStatus::Failed => "❌ Failed",
            RunStatus::Running => "🔄 Running",
            _ => "❓ Unknown",
        };
        format!(
            "{} - {} stages completed, {} failed, {} skipped, {}ms",
            status,
            self.completed_stages().len(),
            self.failed_stages().len(),
            self.skipped_stages().len(),
            self.duration_ms
        )
    }
}

/// Assert a stage completed and check its output
pub fn assert_stage_completed(result: &PipelineTestResult, name: &str, expected_output: &str) {
    let stage = result
        .pipeline
        .stage(name)
        .unwrap_or_else(|| panic!("Stage '{}' not found in result", name));

    assert!(
        matches!(stage.state, StageState::Completed { .. }),
        "Stage '{}' should be completed, but was in state: {:?}",
        name,
        stage.state
    );

    let output = result.stage_output(name).unwrap();
    assert!(
        output.contains(expected_output),
        "Stage '{}' output:\n{}\n\ndoes not contain:\n{}",
        name,
        output,
        expected_output
    );
}

/// Assert a stage failed with a specific message
pub fn assert_stage_failed(result: &PipelineTestResult, name: &str, expected_error: &str) {
    let stage = result
        .pipeline
        .stage(name)
        .unwrap_or_else(|| panic!("Stage '{}' not found in result", name));

    assert!(
        matches!(stage.state, StageState::Failed { .. }),
        "Stage '{}' should have failed, but was in state: {:?}",
        name,
        stage.state
    );

    let error = result.stage_error(name).unwrap();
    assert!(
        error.contains(expected_error),
        "Stage '{}' error:\n{}\n\ndoes not contain:\n{}",
        name,
        error,
        expected_error
    );
}

/// Assert a stage was skipped
pub fn assert_stage_skipped(result: &PipelineTestResult, name: &str) {
    let state = result
        .stage_state(name)
        .unwrap_or_else(|| panic!("Stage '{}' not found in result", name));

    assert!(
        matches!(state, StageState::Skipped { .. }),
        "Stage '{}' should be skipped, but was in state: {:?}",
        name,
        state
    );
}

/// Assert the run completed successfully
pub fn assert_run_completed(result: &PipelineTestResult) {
    assert!(
        result.is_success(),
        "Run should be completed, but was: {}",
        result.summary()
    );
}

/// Assert the run failed
pub fn assert_run_failed(result: &PipelineTestResult) {
    assert!(
        result.is_failed(),
        "Run should have failed, but was: {}",
        result.summary()
    );
}

/// Assert stages reached the sandbox in the given order
pub fn assert_execution_order(executed: &Arc<Mutex<Vec<String>>>, expected: &[&str]) {
    let actual = executed.lock().unwrap().clone();
    assert_eq!(
        actual, expected,
        "Expected execution order: {:?}\nActual: {:?}",
        expected, actual
    );
}

/// Parse a pipeline from a YAML string
pub fn pipeline_from_yaml(yaml: &str) -> Pipeline {
    let config = PipelineConfig::from_yaml(yaml)
        .unwrap_or_else(|e| panic!("Failed to parse pipeline YAML: {}", e));
    config.to_pipeline()
}

/// Create a minimal pipeline for testing
pub fn minimal_pipeline() -> Pipeline {
    let yaml = r#"
name: "Test Pipeline"
pipeline:
  - name: build
    image: alpine
    commands:
      - make
"#;
    pipeline_from_yaml(yaml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_pipeline_with_mock_simple() {
        let mut pipeline = minimal_pipeline();
        let result = run_pipeline_with_mock(&mut pipeline, RunEvent::Push, &[]).await;

        assert_run_completed(&result);
        assert_stage_completed(&result, "build", "ran build");
    }

    #[tokio::test]
    async fn test_mock_sandbox_failure() {
        let mut pipeline = minimal_pipeline();
        let result = run_pipeline_with_mock(&mut pipeline, RunEvent::Push, &["build"]).await;

        assert_run_failed(&result);
        assert_stage_failed(&result, "build", "exited with code 1");
    }

    #[tokio::test]
    async fn test_execution_order_recorded() {
        let yaml = r#"
name: "Order"
pipeline:
  - name: a
    image: alpine
    commands: ["true"]
  - name: b
    image: alpine
    commands: ["true"]
"#;
        let mut pipeline = pipeline_from_yaml(yaml);
        let sandbox = MockSandbox::new();
        let executed = sandbox.executed();

        run_pipeline_with_sandbox(&mut pipeline, RunEvent::Push, sandbox, None).await;

        assert_execution_order(&executed, &["a", "b"]);
    }
}
