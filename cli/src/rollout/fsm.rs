//! Finite state machine for one rollout

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rollout phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RolloutPhase {
    /// Start/update request sent, waiting for the controller to acknowledge
    Staging,

    /// Polling instance health
    AwaitHealth,

    /// Every expected instance is running
    Healthy,

    /// An instance crashed after the rollout began
    Crashed,

    /// Gave up waiting; the app may still come up
    TimedOut,

    /// Nothing to do (app missing or already in the target state)
    Aborted,
}

impl RolloutPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RolloutPhase::Healthy
                | RolloutPhase::Crashed
                | RolloutPhase::TimedOut
                | RolloutPhase::Aborted
        )
    }
}

/// Why a rollout never started polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    NotFound,
    AlreadyStarted,
}

/// What triggered the rollout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloutOrigin {
    /// A fresh push; a crash offers to delete the new app
    Push,

    /// A start or restart of an existing app
    Restart,
}

/// A crash observed during the rollout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashRecord {
    pub instance_index: u32,
    pub crashed_at: i64,
}

/// Rollout event
#[derive(Debug, Clone)]
pub enum RolloutEvent {
    /// Controller acknowledged the start request
    Acknowledged,

    /// Start request short-circuited
    Abort(AbortReason),

    /// One polling interval elapsed
    Tick,

    /// Health reading came back fully running
    Healthy,

    /// Crash records found since the rollout began
    Crashed(Vec<CrashRecord>),

    /// Tick budget exhausted
    GaveUp,
}

/// State of a single rollout, discarded once a terminal phase is reached
#[derive(Debug, Clone)]
pub struct RolloutState {
    app_name: String,
    started_at: DateTime<Utc>,
    tick_count: u32,
    phase: RolloutPhase,
    crash_set: Vec<CrashRecord>,
    abort_reason: Option<AbortReason>,
}

impl RolloutState {
    /// Create a new rollout in the staging phase
    pub fn new(app_name: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            app_name: app_name.into(),
            started_at,
            tick_count: 0,
            phase: RolloutPhase::Staging,
            crash_set: Vec::new(),
            abort_reason: None,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Ticks elapsed; the first polling iteration is tick 1
    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    pub fn phase(&self) -> RolloutPhase {
        self.phase
    }

    pub fn crash_set(&self) -> &[CrashRecord] {
        &self.crash_set
    }

    pub fn abort_reason(&self) -> Option<&AbortReason> {
        self.abort_reason.as_ref()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: RolloutEvent) -> Result<(), String> {
        let new_phase = match (self.phase, event) {
            // From Staging
            (RolloutPhase::Staging, RolloutEvent::Acknowledged) => RolloutPhase::AwaitHealth,
            (RolloutPhase::Staging, RolloutEvent::Abort(reason)) => {
                self.abort_reason = Some(reason);
                RolloutPhase::Aborted
            }

            // From AwaitHealth
            (RolloutPhase::AwaitHealth, RolloutEvent::Tick) => {
                self.tick_count += 1;
                RolloutPhase::AwaitHealth
            }
            (RolloutPhase::AwaitHealth, RolloutEvent::Healthy) => RolloutPhase::Healthy,
            (RolloutPhase::AwaitHealth, RolloutEvent::Crashed(records)) => {
                self.crash_set.extend(records);
                RolloutPhase::Crashed
            }
            (RolloutPhase::AwaitHealth, RolloutEvent::GaveUp) => RolloutPhase::TimedOut,

            // Invalid transitions
            (phase, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", phase, event));
            }
        };

        self.phase = new_phase;
        Ok(())
    }
}
