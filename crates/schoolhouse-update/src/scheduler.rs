//! Check scheduling: the rate limit between checks and the background loop
//! that drives timer-triggered cycles.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use crate::checker::{CycleOutcome, UpdateChecker};
use crate::prompt::{Trigger, UserPrompt};
use crate::restart::Restarter;
use crate::source::UpdateSource;

/// Owns the time of the last check. Callers pass `now` in, so the schedule
/// can be exercised without real timers.
#[derive(Debug, Clone)]
pub struct CheckScheduler {
    interval: Duration,
    last_check: Option<Instant>,
}

impl CheckScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_check: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_check(&self) -> Option<Instant> {
        self.last_check
    }

    /// A check is due if none has run yet or the interval has elapsed.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_check {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn mark_checked(&mut self, now: Instant) {
        self.last_check = Some(now);
    }

    /// Mark a check as started if one is due.
    pub fn try_claim(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.mark_checked(now);
            true
        } else {
            false
        }
    }
}

/// Background loop that offers the checker a timer-triggered cycle every tick.
pub struct UpdateLoop<S, P, R> {
    checker: Arc<UpdateChecker<S, P, R>>,
    tick: Duration,
    shutdown: Arc<Notify>,
}

impl<S, P, R> UpdateLoop<S, P, R>
where
    S: UpdateSource,
    P: UserPrompt,
    R: Restarter,
{
    pub fn new(checker: Arc<UpdateChecker<S, P, R>>, tick: Duration) -> Self {
        Self {
            checker,
            tick,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Run until `shutdown` is called. The first cycle is offered one tick
    /// after start.
    pub async fn run(&self) {
        tracing::info!(tick_secs = self.tick.as_secs(), "Update loop started");
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + self.tick, self.tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.checker.run_cycle(Trigger::Timer).await {
                        CycleOutcome::NotDue => {}
                        CycleOutcome::Unreachable(reason) => {
                            tracing::warn!(reason = %reason, "Could not check for updates");
                        }
                        outcome => tracing::debug!(outcome = outcome.label(), "Timer cycle done"),
                    }
                }
                _ = self.shutdown.notified() => {
                    tracing::info!("Update loop stopped");
                    return;
                }
            }
        }
    }

    /// Signal the loop to stop.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}
