//! Execution sandbox - runs stage commands in an isolated environment

use crate::core::{RunnerError, Stage};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Captured result of a successful stage execution
#[derive(Debug, Clone)]
pub struct StageOutput {
    /// Combined stdout/stderr of all commands, secrets redacted
    pub output: String,
}

/// Runs a stage's command list inside an isolated environment.
///
/// Implementations must guarantee environment teardown on success,
/// failure, and cancellation.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Run every command of the stage in order, aborting on the first
    /// non-zero exit. `secrets` maps env-var names to resolved values.
    async fn run_stage(
        &self,
        stage: &Stage,
        secrets: &BTreeMap<String, String>,
    ) -> Result<StageOutput, RunnerError>;
}

/// Process-backed sandbox.
///
/// Each stage gets a fresh scratch working directory and a clean
/// environment composed of the stage's `environment`, the resolved
/// secrets, and a handful of standard CI variables. The stage's image
/// reference is recorded in logs only; container runtimes are an
/// external concern.
#[derive(Debug, Clone)]
pub struct ProcessSandbox {
    shell: String,
    workdir_root: PathBuf,
}

impl ProcessSandbox {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
            workdir_root: std::env::temp_dir(),
        }
    }

    /// Override where scratch directories are created
    pub fn with_workdir_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workdir_root = root.into();
        self
    }

    fn compose_env(
        &self,
        stage: &Stage,
        secrets: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        if let Ok(path) = std::env::var("PATH") {
            env.insert("PATH".to_string(), path);
        }
        env.insert("CI".to_string(), "true".to_string());
        env.insert("STAGEHAND_STAGE".to_string(), stage.name.clone());
        env.insert("STAGEHAND_IMAGE".to_string(), stage.image.clone());
        env.extend(stage.environment.clone());
        env.extend(secrets.clone());
        env
    }
}

impl Default for ProcessSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    async fn run_stage(
        &self,
        stage: &Stage,
        secrets: &BTreeMap<String, String>,
    ) -> Result<StageOutput, RunnerError> {
        let scratch = self
            .workdir_root
            .join(format!("stagehand-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&scratch).map_err(RunnerError::Spawn)?;

        // Removed when this guard drops, on every exit path including
        // cancellation at an await point.
        let _scratch = ScratchDir::new(&scratch);

        debug!(
            stage = %stage.name,
            image = %stage.image,
            workdir = %scratch.display(),
            "sandbox ready"
        );

        let env = self.compose_env(stage, secrets);
        let secret_values: Vec<&str> = secrets.values().map(String::as_str).collect();
        let deadline = Instant::now() + Duration::from_secs(stage.timeout_secs);

        let mut combined = String::new();
        for command in &stage.commands {
            debug!(stage = %stage.name, command = %command, "running command");

            let remaining = deadline.saturating_duration_since(Instant::now());
            let result = timeout(
                remaining,
                Command::new(&self.shell)
                    .arg("-c")
                    .arg(command)
                    .env_clear()
                    .envs(&env)
                    .current_dir(&scratch)
                    .kill_on_drop(true)
                    .output(),
            )
            .await
            .map_err(|_| RunnerError::Timeout {
                stage: stage.name.clone(),
                timeout_secs: stage.timeout_secs,
            })?;

            let output = result.map_err(RunnerError::Spawn)?;

            combined.push_str(&redact(
                &String::from_utf8_lossy(&output.stdout),
                &secret_values,
            ));
            combined.push_str(&redact(
                &String::from_utf8_lossy(&output.stderr),
                &secret_values,
            ));

            if !output.status.success() {
                let exit_code = output.status.code().unwrap_or(-1);
                warn!(
                    stage = %stage.name,
                    command = %command,
                    exit_code,
                    "command failed, aborting stage"
                );
                return Err(RunnerError::Command {
                    command: command.clone(),
                    exit_code,
                    output: combined,
                });
            }
        }

        Ok(StageOutput { output: combined })
    }
}

/// Replace resolved secret values in captured output
fn redact(text: &str, secret_values: &[&str]) -> String {
    let mut redacted = text.to_string();
    for value in secret_values {
        if !value.is_empty() {
            redacted = redacted.replace(value, "***");
        }
    }
    redacted
}

/// RAII guard for a sandbox scratch directory
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to remove scratch dir");
        }
    }
}
