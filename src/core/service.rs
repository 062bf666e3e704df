//! Service domain model

use crate::core::config::ServiceConfig;
use std::collections::BTreeMap;

/// A long-lived auxiliary dependency, owned by a single pipeline run.
///
/// Started before the first stage that depends on it and torn down when
/// the run ends.
#[derive(Debug, Clone)]
pub struct Service {
    /// Service name as declared under `services:`
    pub name: String,

    /// Image reference for the service
    pub image: String,

    /// Environment for the service process and its health check
    pub environment: BTreeMap<String, String>,

    /// Command to run as the service process, if the runner owns it
    pub command: Option<String>,

    /// Health-check command polled until it exits zero
    pub ready_command: Option<String>,

    /// How long to wait for readiness before failing dependents
    pub startup_timeout_secs: u64,
}

impl Service {
    pub fn from_config(name: &str, config: &ServiceConfig) -> Self {
        Service {
            name: name.to_string(),
            image: config.image.clone(),
            environment: config.environment.clone(),
            command: config.command.clone(),
            ready_command: config.ready_command.clone(),
            startup_timeout_secs: config.startup_timeout_secs,
        }
    }
}
