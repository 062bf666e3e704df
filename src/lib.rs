//! stagehand - A declarative CI pipeline runner

pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;

// Re-export commonly used types
pub use crate::core::{ConfigError, Pipeline, RunEvent, RunStatus, RunnerError, Stage, StageState};
pub use crate::execution::{ExecutionEngine, ExecutionEvent, ProcessSandbox, Sandbox};
pub use crate::persistence::{create_summary, HistoryBackend, InMemoryHistory, RunSummary};
