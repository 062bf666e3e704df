//! Stage domain model

use crate::core::config::{GateConfig, StageConfig};
use crate::core::gate::{Gate, GateStatus, RunEvent};
use crate::core::state::StageState;
use std::collections::BTreeMap;

/// A named unit of sequential command execution
#[derive(Debug, Clone)]
pub struct Stage {
    /// Unique stage name
    pub name: String,

    /// Image reference the stage runs in
    pub image: String,

    /// Environment variables for stage commands
    pub environment: BTreeMap<String, String>,

    /// Ordered shell commands, aborted on first non-zero exit
    pub commands: Vec<String>,

    /// Names of secrets to resolve and inject
    pub secrets: Vec<String>,

    /// Names of services this stage depends on
    pub services: Vec<String>,

    /// Conditional gate
    pub gate: Gate,

    /// Timeout in seconds for the whole stage
    pub timeout_secs: u64,

    /// Runtime state
    pub state: StageState,
}

#[derive(Debug, Clone)]
pub struct StageDefaults {
    pub timeout_secs: u64,
}

impl Default for StageDefaults {
    fn default() -> Self {
        Self { timeout_secs: 600 }
    }
}

impl Stage {
    /// Create a stage from a stage config.
    ///
    /// Gate event/status names have already been validated by
    /// `PipelineConfig::validate`, so unknown names are dropped here.
    pub fn from_config(config: &StageConfig, defaults: &StageDefaults) -> Self {
        Stage {
            name: config.name.clone(),
            image: config.image.clone(),
            environment: config.environment.clone(),
            commands: config.commands.clone(),
            secrets: config.secrets.clone(),
            services: config.services.clone(),
            gate: config.when.as_ref().map(build_gate).unwrap_or_default(),
            timeout_secs: config.timeout_secs.unwrap_or(defaults.timeout_secs),
            state: StageState::Pending,
        }
    }
}

fn build_gate(config: &GateConfig) -> Gate {
    Gate {
        events: config
            .event
            .iter()
            .filter_map(|e| RunEvent::parse(e))
            .collect(),
        statuses: config
            .status
            .iter()
            .filter_map(|s| GateStatus::parse(s))
            .collect(),
    }
}
