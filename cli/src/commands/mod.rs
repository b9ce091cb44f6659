//! Command entry points exposed to the argument-parsing layer

pub mod context;
pub mod logs;
pub mod push;
pub mod start;
pub mod update;
pub mod upload;

use crate::rollout::supervisor::RolloutReport;

pub use context::{CommandContext, CommandSettings};

/// Result of a command, mapped to the process exit status
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A start ran through rollout supervision
    Rollout(RolloutReport),

    /// Bits uploaded without starting the app
    Uploaded { app_name: String },

    /// App stopped (or already stopped)
    Stopped { app_name: String },

    /// Crash logs printed
    Logs { app_name: String, shown: usize },
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Rollout(report) => report.exit_code(),
            _ => 0,
        }
    }

    pub fn rollout(&self) -> Option<&RolloutReport> {
        match self {
            Outcome::Rollout(report) => Some(report),
            _ => None,
        }
    }
}
