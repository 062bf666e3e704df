//! Test: Failure Gating - failure-gated stages run when earlier stages fail

use crate::helpers::*;
use stagehand::core::RunEvent;

/// A failure-gated notification stage runs after a build failure while
/// the default-gated stage between them is skipped
#[tokio::test]
async fn test_notification_runs_on_failure() {
    let yaml = r#"
name: "Test: Notify on Failure"

pipeline:
  - name: build
    image: python:3.9
    commands:
      - make

  - name: deploy
    image: alpine
    commands:
      - ./deploy.sh

  - name: email
    image: plugins/email
    when:
      status: [failure]
    commands:
      - send-report
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let sandbox = MockSandbox::failing(&["build"]);
    let executed = sandbox.executed();

    let result = run_pipeline_with_sandbox(&mut pipeline, RunEvent::Push, sandbox, None).await;

    assert_run_failed(&result);
    assert_stage_failed(&result, "build", "exited with code 1");
    assert_stage_skipped(&result, "deploy");
    assert_stage_completed(&result, "email", "ran email");
    assert_execution_order(&executed, &["build", "email"]);
}

/// A failure-gated stage is skipped when everything succeeds
#[tokio::test]
async fn test_failure_gated_skipped_on_success() {
    let yaml = r#"
name: "Test: No Notification on Success"

pipeline:
  - name: build
    image: python:3.9
    commands:
      - make

  - name: email
    image: plugins/email
    when:
      status: [failure]
    commands:
      - send-report
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let result = run_pipeline_with_mock(&mut pipeline, RunEvent::Push, &[]).await;

    assert_run_completed(&result);
    assert_stage_completed(&result, "build", "ran build");
    assert_stage_skipped(&result, "email");
}

/// A stage gated on both outcomes runs either way
#[tokio::test]
async fn test_always_gated_stage_runs_on_failure() {
    let yaml = r#"
name: "Test: Always Notify"

pipeline:
  - name: build
    image: python:3.9
    commands:
      - make

  - name: slack
    image: plugins/slack
    when:
      status: [success, failure]
    commands:
      - notify
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let failed = run_pipeline_with_mock(&mut pipeline, RunEvent::Push, &["build"]).await;
    assert_run_failed(&failed);
    assert_stage_completed(&failed, "slack", "ran slack");

    let mut pipeline = pipeline_from_yaml(yaml);
    let succeeded = run_pipeline_with_mock(&mut pipeline, RunEvent::Push, &[]).await;
    assert_run_completed(&succeeded);
    assert_stage_completed(&succeeded, "slack", "ran slack");
}

/// A failing notification stage also marks the run failed
#[tokio::test]
async fn test_failing_notification_fails_run() {
    let yaml = r#"
name: "Test: Notification Failure"

pipeline:
  - name: build
    image: python:3.9
    commands:
      - make

  - name: slack
    image: plugins/slack
    when:
      status: [success, failure]
    commands:
      - notify
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let result = run_pipeline_with_mock(&mut pipeline, RunEvent::Push, &["slack"]).await;

    assert_run_failed(&result);
    assert_stage_completed(&result, "build", "ran build");
    assert_stage_failed(&result, "slack", "exited with code 1");
}
