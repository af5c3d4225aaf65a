//! Import session state machine
//!
//! One session is one full pass over the dump:
//! NotStarted → Running → SweepPending → Completed, or Running → Failed on
//! an unrecoverable error. The Running transition captures the timestamp
//! every touch is measured against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Import session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportState {
    /// Session created, watermark not yet captured
    NotStarted,
    /// Records are being processed
    Running,
    /// Stream exhausted; stale-entity sweep pending
    SweepPending,
    /// Full pass and sweep finished
    Completed,
    /// Unrecoverable error; the sweep did not run
    Failed,
}

impl ImportState {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportState::NotStarted => "NOTSTARTED",
            ImportState::Running => "RUNNING",
            ImportState::SweepPending => "SWEEPPENDING",
            ImportState::Completed => "COMPLETED",
            ImportState::Failed => "FAILED",
        }
    }
}

/// Per-session record accounting
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SessionCounts {
    /// Records fully committed
    pub processed: u64,
    /// Records skipped before their transaction (no remote id)
    pub skipped: u64,
    /// Records rolled back on a record-scoped error
    pub failed: u64,
    /// Rows deleted by the stale-entity sweep
    pub swept: u64,
}

/// One import session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImporterSession {
    pub session_id: Uuid,
    pub state: ImportState,
    pub counts: SessionCounts,
    /// Operator-facing description of what the session is doing
    pub current_operation: String,
    /// Touch watermark, captured at the NotStarted → Running transition
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ImporterSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: ImportState::NotStarted,
            counts: SessionCounts::default(),
            current_operation: String::from("Initializing..."),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to a new state
    ///
    /// Entering Running re-captures `started_at` as the session watermark;
    /// terminal states stamp `ended_at`.
    pub fn transition_to(&mut self, new_state: ImportState) {
        if self.state == ImportState::NotStarted && new_state == ImportState::Running {
            self.started_at = Utc::now();
        }
        self.state = new_state;

        match new_state {
            ImportState::Completed | ImportState::Failed => {
                self.ended_at = Some(Utc::now());
            }
            _ => {}
        }
    }

    pub fn set_operation(&mut self, operation: impl Into<String>) {
        self.current_operation = operation.into();
    }

    /// Check if the session is finished
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, ImportState::Completed | ImportState::Failed)
    }
}

impl Default for ImporterSession {
    fn default() -> Self {
        Self::new()
    }
}
