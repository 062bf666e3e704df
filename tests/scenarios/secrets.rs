//! Test: Secrets - resolution, injection, and failure before execution

use crate::helpers::*;
use stagehand::core::secret::{EnvSecretStore, LayeredSecretStore, StaticSecretStore};
use stagehand::core::RunEvent;
use stagehand::execution::ExecutionEngine;
use std::sync::Arc;

/// Declared secrets reach the sandbox as uppercased env-var names
#[tokio::test]
async fn test_secrets_injected_as_env_vars() {
    let yaml = r#"
name: "Test: Secret Injection"

pipeline:
  - name: notify
    image: plugins/slack
    secrets:
      - slack_webhook
    commands:
      - notify
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let sandbox = MockSandbox::new();
    let seen = sandbox.seen_secrets();

    let mut secrets = StaticSecretStore::new();
    secrets.insert("slack_webhook", "https://hooks.example/T00");

    let result =
        run_pipeline_with_sandbox(&mut pipeline, RunEvent::Push, sandbox, Some(secrets)).await;

    assert_run_completed(&result);
    let seen = seen.lock().unwrap();
    let injected = seen.get("notify").unwrap();
    assert_eq!(
        injected.get("SLACK_WEBHOOK").map(String::as_str),
        Some("https://hooks.example/T00")
    );
}

/// An unresolvable secret fails the stage before any command runs
#[tokio::test]
async fn test_missing_secret_fails_stage_before_commands() {
    let yaml = r#"
name: "Test: Missing Secret"

pipeline:
  - name: notify
    image: plugins/slack
    secrets:
      - slack_webhook
    commands:
      - notify
"#;

    let mut pipeline = pipeline_from_yaml(yaml);
    let sandbox = MockSandbox::new();
    let executed = sandbox.executed();

    let result = run_pipeline_with_sandbox(&mut pipeline, RunEvent::Push, sandbox, None).await;

    assert_run_failed(&result);
    assert_stage_failed(&result, "notify", "slack_webhook");
    assert!(executed.lock().unwrap().is_empty());
}

/// A missing secret counts as a failure for gating purposes
#[tokio::test]
async fn test_missing_secret_triggers_failure_gated_stage() {
    let yaml = r#"
name: "Test: Secret Failure Gating"

pipeline:
  - name: deploy
    image: alpine
    secrets:
      - deploy_key
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
    let result = run_pipeline_with_mock(&mut pipeline, RunEvent::Push, &[]).await;

    assert_run_failed(&result);
    assert_stage_failed(&result, "deploy", "deploy_key");
    assert_stage_completed(&result, "email", "ran email");
}

/// Layered resolution prefers overrides and falls back to the environment
#[tokio::test]
async fn test_layered_resolution_with_environment_fallback() {
    let yaml = r#"
name: "Test: Layered Secrets"

pipeline:
  - name: notify
    image: plugins/slack
    secrets:
      - layered_token
    commands:
      - notify
"#;

    std::env::set_var("STAGEHAND_SECRET_LAYERED_TOKEN", "from-env");

    let mut overrides = StaticSecretStore::new();
    overrides.insert("other", "unrelated");
    let store = LayeredSecretStore::new(vec![
        Box::new(overrides),
        Box::new(EnvSecretStore::new()),
    ]);

    let mut pipeline = pipeline_from_yaml(yaml);
    let sandbox = MockSandbox::new();
    let seen = sandbox.seen_secrets();

    let engine = ExecutionEngine::new(sandbox, Arc::new(store));
    let status = engine.execute(&mut pipeline, RunEvent::Push).await;

    std::env::remove_var("STAGEHAND_SECRET_LAYERED_TOKEN");

    assert_eq!(status, stagehand::core::RunStatus::Completed);
    let seen = seen.lock().unwrap();
    assert_eq!(
        seen.get("notify").unwrap().get("LAYERED_TOKEN").map(String::as_str),
        Some("from-env")
    );
}
