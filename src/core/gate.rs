//! Conditional gates restricting when a stage runs

use serde::{Deserialize, Serialize};

/// The event that triggered a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEvent {
    Push,
    PullRequest,
    Tag,
    Manual,
    Cron,
}

impl RunEvent {
    /// Parse an event name as it appears in a `when` clause
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "push" => Some(RunEvent::Push),
            "pull_request" => Some(RunEvent::PullRequest),
            "tag" => Some(RunEvent::Tag),
            "manual" => Some(RunEvent::Manual),
            "cron" => Some(RunEvent::Cron),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunEvent::Push => "push",
            RunEvent::PullRequest => "pull_request",
            RunEvent::Tag => "tag",
            RunEvent::Manual => "manual",
            RunEvent::Cron => "cron",
        }
    }
}

/// Run outcome a gate can match against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    Success,
    Failure,
}

impl GateStatus {
    /// Parse a status name as it appears in a `when` clause
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "success" => Some(GateStatus::Success),
            "failure" => Some(GateStatus::Failure),
            _ => None,
        }
    }
}

/// Predicate restricting stage execution to certain events and run outcomes.
///
/// An empty event list matches any event. An empty status list is the
/// default gate: the stage runs only while the run is still succeeding.
/// This is what makes a stage failure abort the remaining sequence while
/// stages gated on `status: [failure]` still execute.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    pub events: Vec<RunEvent>,
    pub statuses: Vec<GateStatus>,
}

impl Gate {
    /// Evaluate the gate against the triggering event and the run outcome
    /// observed so far.
    pub fn matches(&self, event: RunEvent, failed_so_far: bool) -> bool {
        let event_ok = self.events.is_empty() || self.events.contains(&event);

        let current = if failed_so_far {
            GateStatus::Failure
        } else {
            GateStatus::Success
        };
        let status_ok = if self.statuses.is_empty() {
            !failed_so_far
        } else {
            self.statuses.contains(&current)
        };

        event_ok && status_ok
    }
}
