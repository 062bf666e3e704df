//! Main execution engine - orchestrates an entire pipeline run

use crate::{
    core::{
        secret::resolve_stage_secrets, Pipeline, RunEvent, RunStatus, SecretStore, StageState,
    },
    execution::{sandbox::Sandbox, scheduler::{ScheduleDecision, StageScheduler}, services::ServiceManager},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during a pipeline run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        pipeline_name: String,
        event: RunEvent,
    },
    ServiceStarting {
        service: String,
        image: String,
    },
    ServiceReady {
        service: String,
    },
    StageStarted {
        stage: String,
        image: String,
    },
    StageOutput {
        stage: String,
        output: String,
    },
    StageCompleted {
        stage: String,
    },
    StageFailed {
        stage: String,
        error: String,
    },
    StageSkipped {
        stage: String,
        reason: String,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Main pipeline execution engine
pub struct ExecutionEngine<S> {
    sandbox: Arc<S>,
    secrets: Arc<dyn SecretStore>,
    event_handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl<S: Sandbox + 'static> ExecutionEngine<S> {
    pub fn new(sandbox: S, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            sandbox: Arc::new(sandbox),
            secrets,
            event_handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add an event handler
    pub async fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.lock().await.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    async fn emit_event(&self, event: ExecutionEvent) {
        let handlers = self.event_handlers.lock().await;
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Execute the entire pipeline for the given trigger event.
    ///
    /// Stage failures do not abort the loop: the run is marked failed and
    /// later stages are gated on that outcome, so failure-gated
    /// notification stages still execute. Services are torn down before
    /// returning, on every path.
    pub async fn execute(&self, pipeline: &mut Pipeline, event: RunEvent) -> RunStatus {
        let run_id = pipeline.state.run_id;
        info!(
            pipeline = %pipeline.name,
            run_id = %run_id,
            event = event.as_str(),
            "starting pipeline run"
        );

        pipeline.state.start(event, pipeline.stages.len());
        self.emit_event(ExecutionEvent::RunStarted {
            run_id,
            pipeline_name: pipeline.name.clone(),
            event,
        })
        .await;

        let mut scheduler = StageScheduler::new();
        let mut services = ServiceManager::new();

        while let Some(decision) = scheduler.next(pipeline, event, &services.running_names()) {
            match decision {
                ScheduleDecision::Skip { stage, reason } => {
                    info!(stage = %stage, reason = %reason, "skipping stage");
                    if let Some(s) = pipeline.stage_mut(&stage) {
                        s.state = StageState::Skipped {
                            reason: reason.clone(),
                        };
                    }
                    self.emit_event(ExecutionEvent::StageSkipped { stage, reason })
                        .await;
                }
                ScheduleDecision::Run {
                    stage,
                    pending_services,
                } => {
                    self.execute_stage(pipeline, &stage, &pending_services, &mut services)
                        .await;
                }
            }
            pipeline.refresh_counts();
        }

        // Services live until the end of the run, then always come down.
        services.teardown().await;

        let status = if pipeline.has_failed() {
            pipeline.state.fail();
            RunStatus::Failed
        } else {
            pipeline.state.complete();
            RunStatus::Completed
        };

        info!(
            pipeline = %pipeline.name,
            run_id = %run_id,
            status = status.as_str(),
            "pipeline run finished"
        );
        self.emit_event(ExecutionEvent::RunCompleted { run_id, status })
            .await;

        status
    }

    /// Execute a single stage: bring up its services, resolve its
    /// secrets, then run its commands in the sandbox.
    async fn execute_stage(
        &self,
        pipeline: &mut Pipeline,
        stage_name: &str,
        pending_services: &[String],
        services: &mut ServiceManager,
    ) {
        let Some(stage) = pipeline.stage(stage_name).cloned() else {
            error!(stage = %stage_name, "scheduled stage not found");
            return;
        };

        let started_at = chrono::Utc::now();
        if let Some(s) = pipeline.stage_mut(stage_name) {
            s.state = StageState::Running { started_at };
        }
        self.emit_event(ExecutionEvent::StageStarted {
            stage: stage.name.clone(),
            image: stage.image.clone(),
        })
        .await;

        // Dependencies must be healthy before any command runs.
        for service_name in pending_services {
            let Some(service) = pipeline.service(service_name).cloned() else {
                continue;
            };
            self.emit_event(ExecutionEvent::ServiceStarting {
                service: service.name.clone(),
                image: service.image.clone(),
            })
            .await;

            if let Err(e) = services.start(&service).await {
                warn!(stage = %stage.name, service = %service.name, error = %e, "service startup failed");
                self.mark_stage_failed(pipeline, stage_name, e.to_string())
                    .await;
                return;
            }

            self.emit_event(ExecutionEvent::ServiceReady {
                service: service.name.clone(),
            })
            .await;
        }

        let secrets = match resolve_stage_secrets(self.secrets.as_ref(), &stage) {
            Ok(secrets) => secrets,
            Err(e) => {
                warn!(stage = %stage.name, error = %e, "secret resolution failed");
                self.mark_stage_failed(pipeline, stage_name, e.to_string())
                    .await;
                return;
            }
        };

        match self.sandbox.run_stage(&stage, &secrets).await {
            Ok(result) => {
                self.mark_stage_success(pipeline, stage_name, result.output)
                    .await;
            }
            Err(e) => {
                self.mark_stage_failed(pipeline, stage_name, e.to_string())
                    .await;
            }
        }
    }

    /// Mark a stage as completed successfully
    async fn mark_stage_success(&self, pipeline: &mut Pipeline, stage_name: &str, output: String) {
        if let Some(stage) = pipeline.stage_mut(stage_name) {
            let started_at = match &stage.state {
                StageState::Running { started_at } => *started_at,
                _ => chrono::Utc::now(),
            };

            stage.state = StageState::Completed {
                output: output.clone(),
                started_at,
                completed_at: chrono::Utc::now(),
            };
        }

        self.emit_event(ExecutionEvent::StageOutput {
            stage: stage_name.to_string(),
            output,
        })
        .await;
        self.emit_event(ExecutionEvent::StageCompleted {
            stage: stage_name.to_string(),
        })
        .await;
    }

    /// Mark a stage as failed; the run outcome is derived from stage
    /// states when the loop finishes.
    async fn mark_stage_failed(&self, pipeline: &mut Pipeline, stage_name: &str, error: String) {
        if let Some(stage) = pipeline.stage_mut(stage_name) {
            let started_at = match &stage.state {
                StageState::Running { started_at } => *started_at,
                _ => chrono::Utc::now(),
            };

            stage.state = StageState::Failed {
                error: error.clone(),
                started_at,
                failed_at: chrono::Utc::now(),
            };
        }

        self.emit_event(ExecutionEvent::StageFailed {
            stage: stage_name.to_string(),
            error,
        })
        .await;
    }
}
