//! Core domain models for stagehand
//!
//! This module defines the fundamental data structures that represent
//! pipelines, stages, services, and their configuration.

pub mod config;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod secret;
pub mod service;
pub mod stage;
pub mod state;

pub use error::{ConfigError, RunnerError};
pub use gate::{Gate, GateStatus, RunEvent};
pub use pipeline::Pipeline;
pub use secret::{EnvSecretStore, LayeredSecretStore, SecretStore, StaticSecretStore};
pub use service::Service;
pub use stage::Stage;
pub use state::{RunState, RunStatus, StageState};
