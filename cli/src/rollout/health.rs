//! Instance health classification

use std::fmt;

use controller_api::{AppSnapshot, AppState};

/// Health of an application as derived from one controller reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// The health manager has nothing to say
    NotAvailable,
    Stopped,
    /// Every expected instance is running
    FullyRunning,
    /// Share of expected instances running, rounded to a whole percent
    Partial(u32),
}

impl Health {
    pub fn is_fully_running(&self) -> bool {
        matches!(self, Health::FullyRunning)
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Health::NotAvailable => write!(f, "N/A"),
            Health::Stopped => write!(f, "STOPPED"),
            Health::FullyRunning => write!(f, "RUNNING"),
            Health::Partial(percent) => write!(f, "{}%", percent),
        }
    }
}

/// Classify `(lifecycle state, expected instances, running instances)`
pub fn classify(state: Option<AppState>, expected: u32, running: Option<u32>) -> Health {
    match (state, running) {
        (None, _) | (Some(AppState::Unknown), _) => Health::NotAvailable,
        (Some(AppState::Stopped), _) => Health::Stopped,
        (Some(AppState::Started), Some(running)) if expected > 0 => {
            let ratio = (running as f64 / expected as f64 * 1000.0).round() / 1000.0;
            if ratio == 1.0 {
                Health::FullyRunning
            } else {
                Health::Partial((ratio * 100.0).round() as u32)
            }
        }
        _ => Health::NotAvailable,
    }
}

/// One health reading taken during a rollout tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSample {
    pub expected_instances: u32,
    pub running_instances: Option<u32>,
    pub health: Health,
}

impl HealthSample {
    pub fn from_snapshot(app: &AppSnapshot) -> Self {
        Self {
            expected_instances: app.expected_instances,
            running_instances: app.running_instances,
            health: classify(app.state, app.expected_instances, app.running_instances),
        }
    }
}
