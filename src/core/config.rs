//! Pipeline configuration from YAML

use crate::core::error::ConfigError;
use crate::core::gate::{GateStatus, RunEvent};
use crate::core::Pipeline;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    pub name: String,

    /// Pipeline version (optional)
    #[serde(default)]
    pub version: Option<String>,

    /// Ordered list of stages
    #[serde(rename = "pipeline")]
    pub stages: Vec<StageConfig>,

    /// Named auxiliary services
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,

    /// Default timeout for stages (in seconds)
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,
}

/// Stage configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Unique stage name
    pub name: String,

    /// Image reference the stage runs in
    #[serde(default)]
    pub image: String,

    /// Environment variables for stage commands
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Ordered shell commands
    #[serde(default)]
    pub commands: Vec<String>,

    /// Names of secrets to resolve and inject
    #[serde(default)]
    pub secrets: Vec<String>,

    /// Names of services this stage depends on
    #[serde(default)]
    pub services: Vec<String>,

    /// Conditional gate; absent means "run while the run is succeeding"
    #[serde(default)]
    pub when: Option<GateConfig>,

    /// Timeout for this stage (overrides the pipeline default)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Service configuration as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Image reference for the service
    #[serde(default)]
    pub image: String,

    /// Environment variables for the service process
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Command to run as the service process. Without one the service is
    /// assumed to be managed externally and only the health check gates it.
    #[serde(default)]
    pub command: Option<String>,

    /// Health-check command polled until it exits zero
    #[serde(default)]
    pub ready_command: Option<String>,

    /// How long to wait for the health check before giving up
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
}

fn default_startup_timeout() -> u64 {
    30
}

/// Conditional gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Event names the stage runs on (empty = any)
    #[serde(default)]
    pub event: Vec<String>,

    /// Run outcomes the stage runs on (empty = success only)
    #[serde(default)]
    pub status: Vec<String>,
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::EmptyPipeline);
        }

        let mut seen_names = HashSet::new();
        for stage in &self.stages {
            if !seen_names.insert(&stage.name) {
                return Err(ConfigError::DuplicateStage(stage.name.clone()));
            }

            if stage.image.is_empty() {
                return Err(ConfigError::MissingImage {
                    stage: stage.name.clone(),
                });
            }

            if stage.commands.is_empty() {
                return Err(ConfigError::MissingCommands {
                    stage: stage.name.clone(),
                });
            }

            for service in &stage.services {
                if !self.services.contains_key(service) {
                    return Err(ConfigError::UnknownService {
                        stage: stage.name.clone(),
                        service: service.clone(),
                    });
                }
            }

            if let Some(when) = &stage.when {
                for event in &when.event {
                    if RunEvent::parse(event).is_none() {
                        return Err(ConfigError::UnknownEvent {
                            stage: stage.name.clone(),
                            event: event.clone(),
                        });
                    }
                }
                for status in &when.status {
                    if GateStatus::parse(status).is_none() {
                        return Err(ConfigError::UnknownStatus {
                            stage: stage.name.clone(),
                            status: status.clone(),
                        });
                    }
                }
            }
        }

        for (name, service) in &self.services {
            if service.image.is_empty() {
                return Err(ConfigError::MissingServiceImage(name.clone()));
            }
        }

        Ok(())
    }

    /// Convert config to the Pipeline domain model
    pub fn to_pipeline(&self) -> Pipeline {
        Pipeline::from_config(self)
    }
}
