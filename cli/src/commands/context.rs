//! Shared command context

use std::path::PathBuf;

use crate::controller::ControllerClient;
use crate::output::Reporter;
use crate::rollout::rollback::RollbackPrompt;
use crate::rollout::supervisor::{Supervisor, SupervisorSettings};
use crate::rollout::ticker::Ticker;
use crate::sync::reconciler::ReconcileOptions;
use crate::utils::SleepFn;

/// Tunables for the push/start pipeline
#[derive(Debug, Clone, Default)]
pub struct CommandSettings {
    pub supervisor: SupervisorSettings,
    pub reconcile: ReconcileOptions,
    /// Parent of the scratch directory (system temp dir when unset)
    pub scratch_root: Option<PathBuf>,
}

/// Everything a command needs, passed explicitly
pub struct CommandContext<'a> {
    pub client: &'a dyn ControllerClient,
    pub reporter: &'a Reporter,
    pub settings: &'a CommandSettings,
    pub prompt: &'a dyn RollbackPrompt,
    /// Optional indicator shown while blocking requests are in flight
    pub ticker: Option<Ticker>,
    pub sleep_fn: SleepFn,
}

impl<'a> CommandContext<'a> {
    pub fn supervisor(&self) -> Supervisor<'_> {
        Supervisor::new(
            self.client,
            self.reporter,
            &self.settings.supervisor,
            self.prompt,
            self.sleep_fn.clone(),
        )
    }
}
