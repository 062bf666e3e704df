//! CLI command definitions

use crate::core::RunEvent;
use clap::Args;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Event that triggered this run
    #[arg(long, value_enum, default_value_t = EventArg::Push)]
    pub event: EventArg,

    /// Secret overrides (name=value), layered over the environment
    #[arg(long, value_parser = parse_key_value)]
    pub secret: Vec<(String, String)>,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate a pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List pipelines with recorded runs
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Show run counts
    #[arg(long)]
    pub with_counts: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Pipeline name to filter by
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Show full details
    #[arg(long)]
    pub full: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show a specific run ID
    #[arg(long)]
    pub run_id: Option<String>,
}

/// Triggering event argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EventArg {
    Push,
    #[clap(name = "pull-request")]
    PullRequest,
    Tag,
    Manual,
    Cron,
}

impl From<EventArg> for RunEvent {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::Push => RunEvent::Push,
            EventArg::PullRequest => RunEvent::PullRequest,
            EventArg::Tag => RunEvent::Tag,
            EventArg::Manual => RunEvent::Manual,
            EventArg::Cron => RunEvent::Cron,
        }
    }
}

/// Parse name=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid name=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
