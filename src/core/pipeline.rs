//! Pipeline domain model

use crate::core::{
    config::PipelineConfig,
    service::Service,
    stage::{Stage, StageDefaults},
    state::{RunState, RunStatus, StageState},
};
use std::collections::BTreeMap;

/// A pipeline definition plus the state of its current run
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Stages in document order
    pub stages: Vec<Stage>,

    /// Named auxiliary services
    pub services: BTreeMap<String, Service>,

    /// Run state
    pub state: RunState,
}

impl Pipeline {
    /// Create a pipeline from configuration
    pub fn from_config(config: &PipelineConfig) -> Self {
        let defaults = StageDefaults {
            timeout_secs: config
                .default_timeout_secs
                .unwrap_or_else(|| StageDefaults::default().timeout_secs),
        };

        let stages = config
            .stages
            .iter()
            .map(|stage_config| Stage::from_config(stage_config, &defaults))
            .collect();

        let services = config
            .services
            .iter()
            .map(|(name, service_config)| {
                (name.clone(), Service::from_config(name, service_config))
            })
            .collect();

        Pipeline {
            name: config.name.clone(),
            stages,
            services,
            state: RunState::new(),
        }
    }

    /// Get a stage by name
    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Get a mutable stage by name
    pub fn stage_mut(&mut self, name: &str) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.name == name)
    }

    /// Get a service by name
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    /// Check if any stage has failed
    pub fn has_failed(&self) -> bool {
        self.stages
            .iter()
            .any(|s| matches!(s.state, StageState::Failed { .. }))
    }

    /// Check if every stage is in a terminal state
    pub fn is_complete(&self) -> bool {
        self.stages.iter().all(|s| s.state.is_terminal())
    }

    /// Check if the run finished in a failed state
    pub fn run_failed(&self) -> bool {
        self.state.status == RunStatus::Failed
    }

    /// Stage names in execution (document) order
    pub fn stage_order(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name.clone()).collect()
    }

    /// Recompute run counters from stage states
    pub fn refresh_counts(&mut self) {
        let mut completed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for stage in &self.stages {
            match &stage.state {
                StageState::Completed { .. } => completed += 1,
                StageState::Failed { .. } => failed += 1,
                StageState::Skipped { .. } => skipped += 1,
                _ => {}
            }
        }

        self.state.update_counts(completed, failed, skipped);
    }
}
