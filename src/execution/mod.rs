//! Pipeline execution engine

pub mod engine;
pub mod sandbox;
pub mod scheduler;
pub mod services;

pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent};
pub use sandbox::{ProcessSandbox, Sandbox, StageOutput};
pub use scheduler::{ScheduleDecision, StageScheduler};
pub use services::ServiceManager;
