//! Update cycle state machine with thread-safe transitions.
//!
//! - Idle -> Checking
//! - Checking -> UpToDate | Unreachable | UpdateAvailable | Failed
//! - UpdateAvailable -> Applying (accepted) | Idle (declined)
//! - Applying -> Applied | Failed
//! - Applied -> Restarting
//! - Restarting -> Failed (re-exec failed)
//! - UpToDate | Unreachable | Failed -> Idle

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::error::UpdateError;

/// Phase of the update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    /// Waiting for a trigger.
    Idle,
    /// Reading the local artifact and fetching the remote one.
    Checking,
    /// Local and remote digests match.
    UpToDate,
    /// The remote artifact could not be fetched.
    Unreachable,
    /// Digests differ; waiting for the user.
    UpdateAvailable,
    /// Verifying and writing the candidate.
    Applying,
    /// Candidate written over the local artifact.
    Applied,
    /// Re-executing the process.
    Restarting,
    /// The cycle aborted; the old artifact stays in place.
    Failed,
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateState::Idle => "Idle",
            UpdateState::Checking => "Checking",
            UpdateState::UpToDate => "UpToDate",
            UpdateState::Unreachable => "Unreachable",
            UpdateState::UpdateAvailable => "UpdateAvailable",
            UpdateState::Applying => "Applying",
            UpdateState::Applied => "Applied",
            UpdateState::Restarting => "Restarting",
            UpdateState::Failed => "Failed",
        };
        f.write_str(name)
    }
}

impl UpdateState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &UpdateState) -> bool {
        use UpdateState::*;
        matches!(
            (self, target),
            (Idle, Checking)
                | (Checking, UpToDate)
                | (Checking, Unreachable)
                | (Checking, UpdateAvailable)
                | (Checking, Failed)
                | (UpdateAvailable, Applying)
                | (UpdateAvailable, Idle)
                | (Applying, Applied)
                | (Applying, Failed)
                | (Applied, Restarting)
                | (Restarting, Failed)
                | (UpToDate, Idle)
                | (Unreachable, Idle)
                | (Failed, Idle)
        )
    }
}

/// Shared, validated update state.
#[derive(Debug, Clone)]
pub struct UpdateStateMachine {
    state: Arc<Mutex<UpdateState>>,
}

impl Default for UpdateStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateStateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(UpdateState::Idle)),
        }
    }

    pub fn current(&self) -> UpdateState {
        *self.state.lock().expect("state mutex poisoned")
    }

    /// Attempt to transition to the target state.
    pub fn transition(&self, target: UpdateState) -> Result<(), UpdateError> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.can_transition_to(&target) {
            tracing::debug!("Update state: {} -> {}", *state, target);
            *state = target;
            Ok(())
        } else {
            Err(UpdateError::InvalidTransition(*state, target))
        }
    }

    /// Force the state machine back to Idle after a failed cycle.
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if *state != UpdateState::Idle {
            tracing::debug!("Update state reset to Idle from {}", *state);
        }
        *state = UpdateState::Idle;
    }
}
