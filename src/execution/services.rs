//! Service lifecycle management

use crate::core::{RunnerError, Service};
use std::collections::{HashMap, HashSet};
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Owns the lifecycle of a run's auxiliary services.
///
/// Only the engine starts and stops services (single-writer semantics);
/// started children are killed when the run ends, on every exit path.
pub struct ServiceManager {
    shell: String,
    running: HashMap<String, Option<Child>>,
}

impl ServiceManager {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
            running: HashMap::new(),
        }
    }

    /// Check whether a service has already been started this run
    pub fn is_running(&self, name: &str) -> bool {
        self.running.contains_key(name)
    }

    /// Names of services started this run
    pub fn running_names(&self) -> HashSet<String> {
        self.running.keys().cloned().collect()
    }

    /// Start a service and block until it is health-checked ready or the
    /// startup timeout elapses.
    pub async fn start(&mut self, service: &Service) -> Result<(), RunnerError> {
        if self.is_running(&service.name) {
            return Ok(());
        }

        info!(service = %service.name, image = %service.image, "starting service");

        let mut child = match &service.command {
            Some(command) => {
                let child = Command::new(&self.shell)
                    .arg("-c")
                    .arg(command)
                    .envs(&service.environment)
                    .stdout(std::process::Stdio::null())
                    .stderr(std::process::Stdio::null())
                    .kill_on_drop(true)
                    .spawn()
                    .map_err(RunnerError::Spawn)?;
                Some(child)
            }
            // Externally managed service; readiness is gated by the
            // health check alone.
            None => None,
        };

        let startup = Duration::from_secs(service.startup_timeout_secs);
        let ready = timeout(startup, self.await_ready(service, &mut child)).await;

        match ready {
            Ok(Ok(())) => {
                info!(service = %service.name, "service ready");
                self.running.insert(service.name.clone(), child);
                Ok(())
            }
            Ok(Err(e)) => {
                if let Some(child) = child.as_mut() {
                    let _ = child.start_kill();
                }
                Err(e)
            }
            Err(_) => {
                warn!(
                    service = %service.name,
                    timeout_secs = service.startup_timeout_secs,
                    "service did not become ready in time"
                );
                if let Some(child) = child.as_mut() {
                    let _ = child.start_kill();
                }
                Err(RunnerError::ServiceStartup {
                    service: service.name.clone(),
                    timeout_secs: service.startup_timeout_secs,
                })
            }
        }
    }

    async fn await_ready(
        &self,
        service: &Service,
        child: &mut Option<Child>,
    ) -> Result<(), RunnerError> {
        let Some(ready_command) = &service.ready_command else {
            // No health check declared: give the process a moment and
            // treat dead-on-arrival as a startup failure.
            sleep(Duration::from_millis(100)).await;
            if let Some(child) = child.as_mut() {
                if child.try_wait().map_err(RunnerError::Spawn)?.is_some() {
                    return Err(RunnerError::ServiceStartup {
                        service: service.name.clone(),
                        timeout_secs: service.startup_timeout_secs,
                    });
                }
            }
            return Ok(());
        };

        loop {
            // A service that exits while we poll will never come up.
            if let Some(child) = child.as_mut() {
                if child.try_wait().map_err(RunnerError::Spawn)?.is_some() {
                    return Err(RunnerError::ServiceStartup {
                        service: service.name.clone(),
                        timeout_secs: service.startup_timeout_secs,
                    });
                }
            }

            let status = Command::new(&self.shell)
                .arg("-c")
                .arg(ready_command)
                .envs(&service.environment)
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .kill_on_drop(true)
                .status()
                .await
                .map_err(RunnerError::Spawn)?;

            if status.success() {
                return Ok(());
            }

            debug!(service = %service.name, "health check not ready yet");
            sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Kill and reap every started service
    pub async fn teardown(&mut self) {
        for (name, child) in self.running.drain() {
            let Some(mut child) = child else { continue };
            debug!(service = %name, "stopping service");
            if let Err(e) = child.start_kill() {
                warn!(service = %name, error = %e, "failed to kill service");
                continue;
            }
            let _ = child.wait().await;
        }
    }
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}
