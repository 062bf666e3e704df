//! Runner error taxonomy

use thiserror::Error;

/// Errors produced while loading or validating a pipeline document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read pipeline file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed pipeline document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("pipeline must declare at least one stage")]
    EmptyPipeline,

    #[error("duplicate stage name: {0}")]
    DuplicateStage(String),

    #[error("stage '{stage}' declares no commands")]
    MissingCommands { stage: String },

    #[error("stage '{stage}' declares no image")]
    MissingImage { stage: String },

    #[error("service '{0}' declares no image")]
    MissingServiceImage(String),

    #[error("stage '{stage}' references unknown service '{service}'")]
    UnknownService { stage: String, service: String },

    #[error("stage '{stage}' has unknown event '{event}' in when clause")]
    UnknownEvent { stage: String, event: String },

    #[error("stage '{stage}' has unknown status '{status}' in when clause")]
    UnknownStatus { stage: String, status: String },
}

/// Errors produced while executing a pipeline run
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("service '{service}' failed to become ready within {timeout_secs}s")]
    ServiceStartup { service: String, timeout_secs: u64 },

    #[error("secret '{name}' could not be resolved")]
    SecretResolution { name: String },

    #[error("command `{command}` exited with code {exit_code}")]
    Command {
        command: String,
        exit_code: i32,
        /// Captured stdout/stderr up to and including the failing command,
        /// with secret values redacted.
        output: String,
    },

    #[error("stage '{stage}' timed out after {timeout_secs}s")]
    Timeout { stage: String, timeout_secs: u64 },

    #[error("failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),
}

impl RunnerError {
    /// Captured output attached to the error, if any
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            RunnerError::Command { output, .. } => Some(output),
            _ => None,
        }
    }
}
