//! The update checker: one routine shared by the startup and timer triggers.
//!
//! A cycle reads the local artifact, fetches the remote one, compares
//! digests, asks the user, applies the candidate and restarts. At most one
//! cycle runs at a time; a concurrent trigger gets `CycleOutcome::Busy`.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use schoolhouse_core::config::UpdateConfig;
use serde::Serialize;

use crate::artifact::LocalArtifact;
use crate::digest::ContentDigest;
use crate::error::UpdateError;
use crate::prompt::{Notice, Trigger, UserPrompt};
use crate::restart::Restarter;
use crate::scheduler::CheckScheduler;
use crate::shape::ShapeCheck;
use crate::source::UpdateSource;
use crate::state::{UpdateState, UpdateStateMachine};

/// A fetched remote artifact that differs from the local one.
#[derive(Debug, Clone)]
pub struct UpdateCandidate {
    pub content: Vec<u8>,
    pub digest: ContentDigest,
}

/// Result of comparing the local artifact with the remote one.
#[derive(Debug, Clone)]
pub enum CheckOutcome {
    UpToDate,
    UpdateAvailable(UpdateCandidate),
    /// The remote could not be fetched. Never conflated with `UpToDate`.
    Unreachable(String),
}

/// Result of a full update cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The timer fired before the check interval elapsed.
    NotDue,
    /// Another cycle is in flight.
    Busy,
    UpToDate,
    Unreachable(String),
    /// An update was available and the user said no.
    Declined,
    /// The candidate was written and the restarter returned.
    Restarted,
    /// The old artifact is still in place.
    Failed(UpdateError),
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::NotDue => "not_due",
            CycleOutcome::Busy => "busy",
            CycleOutcome::UpToDate => "up_to_date",
            CycleOutcome::Unreachable(_) => "unreachable",
            CycleOutcome::Declined => "declined",
            CycleOutcome::Restarted => "restarted",
            CycleOutcome::Failed(_) => "failed",
        }
    }
}

/// Snapshot of the checker for logging and display.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateStatus {
    pub state: UpdateState,
    pub checks: u64,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_outcome: Option<String>,
}

pub struct UpdateChecker<S, P, R> {
    source: S,
    prompt: P,
    restarter: R,
    artifact: LocalArtifact,
    shape: ShapeCheck,
    scheduler: Mutex<CheckScheduler>,
    state: UpdateStateMachine,
    in_flight: tokio::sync::Mutex<()>,
    status: Mutex<UpdateStatus>,
}

impl<S, P, R> UpdateChecker<S, P, R>
where
    S: UpdateSource,
    P: UserPrompt,
    R: Restarter,
{
    pub fn new(
        source: S,
        prompt: P,
        restarter: R,
        artifact: LocalArtifact,
        shape: ShapeCheck,
        check_interval: Duration,
    ) -> Self {
        Self {
            source,
            prompt,
            restarter,
            artifact,
            shape,
            scheduler: Mutex::new(CheckScheduler::new(check_interval)),
            state: UpdateStateMachine::new(),
            in_flight: tokio::sync::Mutex::new(()),
            status: Mutex::new(UpdateStatus {
                state: UpdateState::Idle,
                checks: 0,
                last_checked_at: None,
                last_outcome: None,
            }),
        }
    }

    /// Build a checker from configuration. Fails with `NotConfigured` until
    /// both `update.url` and `update.artifact_path` are set.
    pub fn from_config(
        config: &UpdateConfig,
        source: S,
        prompt: P,
        restarter: R,
    ) -> Result<Self, UpdateError> {
        if config.url.trim().is_empty() {
            return Err(UpdateError::NotConfigured("update.url is not set".to_string()));
        }
        let artifact = match config.artifact_path.as_deref() {
            Some(path) if !path.trim().is_empty() => LocalArtifact::new(path, config.keep_backup),
            _ => {
                return Err(UpdateError::NotConfigured(
                    "update.artifact_path is not set".to_string(),
                ))
            }
        };
        Ok(Self::new(
            source,
            prompt,
            restarter,
            artifact,
            ShapeCheck::from_config(config),
            Duration::from_secs(config.check_interval_secs),
        ))
    }

    pub fn artifact(&self) -> &LocalArtifact {
        &self.artifact
    }

    pub fn state(&self) -> UpdateState {
        self.state.current()
    }

    pub fn status(&self) -> UpdateStatus {
        let mut status = self.status.lock().expect("status mutex poisoned").clone();
        status.state = self.state.current();
        status
    }

    /// Compare the local artifact with the remote one.
    ///
    /// A fetch failure yields `Unreachable`; a local read failure is an error.
    pub async fn check(&self) -> Result<CheckOutcome, UpdateError> {
        let local = self.artifact.read()?;

        let remote = match self.source.fetch().await {
            Ok(remote) => remote,
            Err(UpdateError::NetworkUnavailable(reason)) => {
                tracing::warn!(
                    location = self.source.location(),
                    reason = %reason,
                    "Update source unreachable"
                );
                return Ok(CheckOutcome::Unreachable(reason));
            }
            Err(e) => return Err(e),
        };

        let local_digest = ContentDigest::of(&local);
        let remote_digest = ContentDigest::of(&remote);
        tracing::debug!(local = %local_digest, remote = %remote_digest, "Compared artifact digests");

        if local_digest == remote_digest {
            Ok(CheckOutcome::UpToDate)
        } else {
            Ok(CheckOutcome::UpdateAvailable(UpdateCandidate {
                content: remote,
                digest: remote_digest,
            }))
        }
    }

    /// Verify a candidate and write it over the local artifact.
    pub async fn apply(&self, candidate: &UpdateCandidate) -> Result<(), UpdateError> {
        let local = self.artifact.read()?;
        self.shape.check_against(&local, &candidate.content)?;

        if let Some(expected) = self.source.fetch_checksum().await? {
            if expected != candidate.digest {
                return Err(UpdateError::ChecksumMismatch {
                    expected: expected.to_hex(),
                    actual: candidate.digest.to_hex(),
                });
            }
            tracing::debug!(digest = %expected, "Candidate matches published checksum");
        }

        self.artifact.replace(&candidate.content)
    }

    /// Run one update cycle for the given trigger.
    ///
    /// Timer cycles only run when the check interval has elapsed since the
    /// previous check; startup cycles always run and reset the interval.
    pub async fn run_cycle(&self, trigger: Trigger) -> CycleOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!(?trigger, "Update cycle already in flight");
            return CycleOutcome::Busy;
        };

        if !self.claim_slot(trigger, Instant::now()) {
            return CycleOutcome::NotDue;
        }

        tracing::info!(?trigger, location = self.source.location(), "Checking for updates");
        let outcome = match self.drive(trigger).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(error = %err, "Update cycle failed");
                if self.state.transition(UpdateState::Failed).is_err() {
                    tracing::warn!(state = %self.state.current(), "Update failed outside an active phase");
                }
                self.prompt
                    .notify(Notice::UpdateFailed(err.to_string()))
                    .await;
                self.state.reset();
                CycleOutcome::Failed(err)
            }
        };

        self.record(&outcome);
        tracing::info!(outcome = outcome.label(), "Update cycle finished");
        outcome
    }

    fn claim_slot(&self, trigger: Trigger, now: Instant) -> bool {
        let mut scheduler = self.scheduler.lock().expect("scheduler mutex poisoned");
        match trigger {
            Trigger::Startup => {
                scheduler.mark_checked(now);
                true
            }
            Trigger::Timer => scheduler.try_claim(now),
        }
    }

    async fn drive(&self, trigger: Trigger) -> Result<CycleOutcome, UpdateError> {
        self.state.transition(UpdateState::Checking)?;

        let candidate = match self.check().await? {
            CheckOutcome::UpToDate => {
                self.state.transition(UpdateState::UpToDate)?;
                self.state.transition(UpdateState::Idle)?;
                return Ok(CycleOutcome::UpToDate);
            }
            CheckOutcome::Unreachable(reason) => {
                self.state.transition(UpdateState::Unreachable)?;
                self.state.transition(UpdateState::Idle)?;
                return Ok(CycleOutcome::Unreachable(reason));
            }
            CheckOutcome::UpdateAvailable(candidate) => {
                self.state.transition(UpdateState::UpdateAvailable)?;
                candidate
            }
        };

        tracing::info!(digest = %candidate.digest, bytes = candidate.content.len(), "Update available");

        if !self.prompt.confirm_update(trigger).await {
            tracing::info!("Update declined");
            self.state.transition(UpdateState::Idle)?;
            return Ok(CycleOutcome::Declined);
        }

        self.state.transition(UpdateState::Applying)?;
        self.apply(&candidate).await?;
        self.state.transition(UpdateState::Applied)?;

        self.prompt.notify(Notice::UpdateComplete).await;

        self.state.transition(UpdateState::Restarting)?;
        self.restarter.restart()?;
        Ok(CycleOutcome::Restarted)
    }

    fn record(&self, outcome: &CycleOutcome) {
        let mut status = self.status.lock().expect("status mutex poisoned");
        status.checks += 1;
        status.last_checked_at = Some(Utc::now());
        status.last_outcome = Some(outcome.label().to_string());
    }
}
