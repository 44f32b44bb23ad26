//! Finite State Machine for a deployment run

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// Run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Request accepted, nothing sent yet
    Init,

    /// Building the snapshot to deploy
    SnapshotPrep,

    /// Checking request properties and requesting the process
    Submitting,

    /// Waiting for a terminal status
    Polling,

    /// Reactive snapshot and property harvest
    Finalizing,

    /// Run succeeded
    Done,

    /// Run aborted
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

/// Run event
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// Start building the deployment snapshot
    PrepareSnapshot,

    /// Start submission
    Submit,

    /// Process requested, start waiting for it
    Poll,

    /// Process finished successfully, or the wait was skipped
    Finalize,

    /// Finalization completed
    Complete,

    /// Fatal error
    Fail(String),
}

/// Deployment run FSM
#[derive(Debug, Clone)]
pub struct RunStateMachine {
    state: RunState,
    error: Option<String>,
    history: Vec<RunState>,
}

impl RunStateMachine {
    /// Create a new FSM in init state
    pub fn new() -> Self {
        Self {
            state: RunState::Init,
            error: None,
            history: vec![RunState::Init],
        }
    }

    /// Get current state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// States visited so far, starting with init
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: RunEvent) -> Result<RunState, DeployError> {
        let new_state = match (self.state, &event) {
            (RunState::Init, RunEvent::PrepareSnapshot) => RunState::SnapshotPrep,
            (RunState::Init | RunState::SnapshotPrep, RunEvent::Submit) => RunState::Submitting,
            (RunState::Submitting, RunEvent::Poll) => RunState::Polling,
            (RunState::Submitting | RunState::Polling, RunEvent::Finalize) => RunState::Finalizing,
            (RunState::Finalizing, RunEvent::Complete) => RunState::Done,

            (state, RunEvent::Fail(err)) if !state.is_terminal() => {
                self.error = Some(err.clone());
                RunState::Failed
            }

            // Invalid transitions
            (state, event) => {
                return Err(DeployError::Internal(format!(
                    "Invalid transition: {:?} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        self.history.push(new_state);
        Ok(new_state)
    }
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
