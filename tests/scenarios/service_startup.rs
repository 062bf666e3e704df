//! Test: Service Startup - health checks gate stage execution

use crate::helpers::*;
use stagehand::core::RunEvent;

/// A healthy service lets its dependent stage run
#[tokio::test]
async fn test_stage_runs_after_service_ready() {
    let yaml = r#"
name: "Test: Healthy Service"

services:
  database:
    image: postgres:13
    command: sleep 60
    ready_command: "true"
    startup_timeout_secs: 5

pipeline:
  - name: integration
    image: python:3.9
    services:
      - database
    commands:
      - pytest tests/integration
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let result = run_pipeline_with_mock(&mut pipeline, RunEvent::Push, &[]).await;

    assert_run_completed(&result);
    assert_stage_completed(&result, "integration", "ran integration");
}

/// A service whose health check never passes fails the dependent stage
/// without running any of its commands
#[tokio::test]
async fn test_unready_service_fails_stage() {
    let yaml = r#"
name: "Test: Service Never Ready"

services:
  database:
    image: postgres:13
    command: sleep 60
    ready_command: "false"
    startup_timeout_secs: 1

pipeline:
  - name: integration
    image: python:3.9
    services:
      - database
    commands:
      - pytest tests/integration

  - name: email
    image: plugins/email
    when:
      status: [failure]
    commands:
      - send-report
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let sandbox = MockSandbox::new();
    let executed = sandbox.executed();

    let result = run_pipeline_with_sandbox(&mut pipeline, RunEvent::Push, sandbox, None).await;

    assert_run_failed(&result);
    assert_stage_failed(&result, "integration", "failed to become ready within 1s");
    assert_stage_completed(&result, "email", "ran email");
    assert_eq!(*executed.lock().unwrap(), vec!["email"]);
}

/// A service process that dies immediately is a startup failure
#[tokio::test]
async fn test_dead_service_fails_stage() {
    let yaml = r#"
name: "Test: Dead Service"

services:
  cache:
    image: redis:7
    command: "false"
    startup_timeout_secs: 2

pipeline:
  - name: integration
    image: python:3.9
    services:
      - cache
    commands:
      - pytest
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let sandbox = MockSandbox::new();
    let executed = sandbox.executed();

    let result = run_pipeline_with_sandbox(&mut pipeline, RunEvent::Push, sandbox, None).await;

    assert_run_failed(&result);
    assert_stage_failed(&result, "integration", "cache");
    assert!(executed.lock().unwrap().is_empty());
}

/// A service started for one stage stays up for later stages in the run
#[tokio::test]
async fn test_service_shared_across_stages() {
    let yaml = r#"
name: "Test: Shared Service"

services:
  database:
    image: postgres:13
    command: sleep 60
    ready_command: "true"
    startup_timeout_secs: 5

pipeline:
  - name: migrate
    image: python:3.9
    services:
      - database
    commands:
      - ./migrate.sh

  - name: integration
    image: python:3.9
    services:
      - database
    commands:
      - pytest
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let result = run_pipeline_with_mock(&mut pipeline, RunEvent::Push, &[]).await;

    assert_run_completed(&result);
    assert_stage_completed(&result, "migrate", "ran migrate");
    assert_stage_completed(&result, "integration", "ran integration");
}
