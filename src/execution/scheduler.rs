//! Stage scheduler - sequences stages and evaluates gates

use crate::core::{Pipeline, RunEvent};
use std::collections::HashSet;

/// Decision for the next stage in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// Run the stage, after starting any listed services
    Run {
        stage: String,
        /// Services the stage needs that are not running yet
        pending_services: Vec<String>,
    },
    /// Skip the stage; its gate does not match this run
    Skip { stage: String, reason: String },
}

/// Yields stages strictly in document order, one at a time.
///
/// Gates are evaluated against the triggering event and the run outcome
/// observed so far, so a stage failure naturally skips later
/// success-gated stages while failure-gated ones still run.
pub struct StageScheduler {
    cursor: usize,
}

impl StageScheduler {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }

    /// Produce the decision for the next unvisited stage, or `None` when
    /// the document is exhausted.
    pub fn next(
        &mut self,
        pipeline: &Pipeline,
        event: RunEvent,
        running_services: &HashSet<String>,
    ) -> Option<ScheduleDecision> {
        let stage = pipeline.stages.get(self.cursor)?;
        self.cursor += 1;

        let failed_so_far = pipeline.has_failed();
        if !stage.gate.matches(event, failed_so_far) {
            let reason = if failed_so_far {
                "a prior stage failed".to_string()
            } else {
                format!("gate does not match event '{}'", event.as_str())
            };
            return Some(ScheduleDecision::Skip {
                stage: stage.name.clone(),
                reason,
            });
        }

        let pending_services = stage
            .services
            .iter()
            .filter(|name| !running_services.contains(*name))
            .cloned()
            .collect();

        Some(ScheduleDecision::Run {
            stage: stage.name.clone(),
            pending_services,
        })
    }
}

impl Default for StageScheduler {
    fn default() -> Self {
        Self::new()
    }
}
