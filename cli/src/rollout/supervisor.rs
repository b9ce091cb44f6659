//! Rollout supervisor

use std::time::Duration;

use controller_api::CrashInfo;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::controller::ControllerClient;
use crate::errors::CliError;
use crate::output::Reporter;
use crate::rollout::fsm::{
    AbortReason, CrashRecord, RolloutEvent, RolloutOrigin, RolloutPhase, RolloutState,
};
use crate::rollout::health::{Health, HealthSample};
use crate::rollout::logs::{show_crash_logs, LogTail, CRASH_LOG_PATHS, STARTUP_LOG_PATH};
use crate::rollout::rollback::RollbackPrompt;
use crate::utils::SleepFn;

/// Supervisor settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorSettings {
    /// Length of one tick
    pub interval_ms: u64,

    /// Ticks of "not available" tolerated before giving up on the health manager
    pub health_grace_ticks: u32,

    /// Ticks after which the startup log is streamed
    pub tail_ticks: u32,

    /// Ticks after which the rollout is abandoned as timed out
    pub giveup_ticks: u32,

    /// Files shown when an instance crashes
    pub crash_log_paths: Vec<String>,

    /// File tailed while the app is slow to start
    pub startup_log_path: String,
}

impl SupervisorSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            health_grace_ticks: 5,
            tail_ticks: 45,
            giveup_ticks: 120,
            crash_log_paths: CRASH_LOG_PATHS.iter().map(|p| p.to_string()).collect(),
            startup_log_path: STARTUP_LOG_PATH.to_string(),
        }
    }
}

/// Final verdict of a rollout
#[derive(Debug, Clone)]
pub struct RolloutReport {
    pub app_name: String,
    pub phase: RolloutPhase,
    pub ticks: u32,
    /// Last health reading, e.g. `RUNNING` or `67%`
    pub final_status: String,
    pub crashes: Vec<CrashRecord>,
    /// The crashed app was deleted at the operator's request
    pub rolled_back: bool,
    pub abort_reason: Option<AbortReason>,
}

impl RolloutReport {
    pub fn from_state(state: &RolloutState, final_status: impl Into<String>) -> Self {
        Self {
            app_name: state.app_name().to_string(),
            phase: state.phase(),
            ticks: state.tick_count(),
            final_status: final_status.into(),
            crashes: state.crash_set().to_vec(),
            rolled_back: false,
            abort_reason: state.abort_reason().cloned(),
        }
    }

    /// Healthy and timed-out rollouts both count as success
    pub fn is_success(&self) -> bool {
        match self.phase {
            RolloutPhase::Healthy | RolloutPhase::TimedOut => true,
            RolloutPhase::Aborted => self.abort_reason != Some(AbortReason::NotFound),
            _ => false,
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Polls the controller until a rollout reaches a verdict
pub struct Supervisor<'a> {
    client: &'a dyn ControllerClient,
    reporter: &'a Reporter,
    settings: &'a SupervisorSettings,
    prompt: &'a dyn RollbackPrompt,
    sleep_fn: SleepFn,
}

impl<'a> Supervisor<'a> {
    pub fn new(
        client: &'a dyn ControllerClient,
        reporter: &'a Reporter,
        settings: &'a SupervisorSettings,
        prompt: &'a dyn RollbackPrompt,
        sleep_fn: SleepFn,
    ) -> Self {
        Self {
            client,
            reporter,
            settings,
            prompt,
            sleep_fn,
        }
    }

    /// Run the health polling loop for an acknowledged rollout.
    ///
    /// One controller query is outstanding at a time. Transient errors are
    /// reported and the loop carries on; a health manager that stays silent
    /// past the grace period is fatal.
    pub async fn await_health(
        &self,
        state: &mut RolloutState,
        origin: RolloutOrigin,
    ) -> Result<RolloutReport, CliError> {
        if state.phase() != RolloutPhase::AwaitHealth {
            return Err(CliError::Internal(format!(
                "Rollout of '{}' is not awaiting health ({:?})",
                state.app_name(),
                state.phase()
            )));
        }

        let name = state.app_name().to_string();
        let since = state.started_at().timestamp();
        let mut tail = LogTail::new();
        let mut last_health = Health::NotAvailable;

        info!("Waiting for '{}' to become healthy", name);

        loop {
            (self.sleep_fn)(self.settings.interval()).await;
            state.process(RolloutEvent::Tick).map_err(CliError::Internal)?;
            let tick = state.tick_count();

            let sample = match self.client.get_app(&name).await {
                Ok(app) => Some(HealthSample::from_snapshot(&app)),
                Err(e) if e.is_not_found() => return Err(e),
                Err(e) => {
                    self.report_transient(tick, "health check", &e);
                    None
                }
            };
            if let Some(sample) = &sample {
                debug!(
                    "Tick {}: {} ({:?}/{})",
                    tick, sample.health, sample.running_instances, sample.expected_instances
                );
                last_health = sample.health;
            }

            let crashes = match self.client.get_crashes(&name, since).await {
                Ok(crashes) => crashes
                    .into_iter()
                    .filter(|crash| crash.since_ts >= since)
                    .collect::<Vec<_>>(),
                Err(e) => {
                    self.report_transient(tick, "crash check", &e);
                    Vec::new()
                }
            };

            // a crash wins over a healthy reading on the same tick
            if !crashes.is_empty() {
                return self.on_crash(state, crashes, origin, last_health).await;
            }

            match sample.map(|s| s.health) {
                Some(Health::FullyRunning) => {
                    state.process(RolloutEvent::Healthy).map_err(CliError::Internal)?;
                    info!("'{}' is running after {} ticks", name, tick);
                    self.reporter
                        .ok(&format!("Application '{}': {}", name, Health::FullyRunning));
                    return Ok(RolloutReport::from_state(state, Health::FullyRunning.to_string()));
                }
                Some(Health::NotAvailable) if tick > self.settings.health_grace_ticks => {
                    warn!("Health manager silent for '{}' at tick {}", name, tick);
                    return Err(CliError::HealthUnknown(name));
                }
                _ => {}
            }

            if tick > self.settings.tail_ticks {
                if let Err(e) = tail
                    .poll(self.client, self.reporter, &name, &self.settings.startup_log_path)
                    .await
                {
                    self.report_transient(tick, "startup log", &e);
                }
            }

            if tick >= self.settings.giveup_ticks {
                state.process(RolloutEvent::GaveUp).map_err(CliError::Internal)?;
                return Ok(self.on_timeout(state, last_health).await);
            }
        }
    }

    fn report_transient(&self, tick: u32, what: &str, error: &CliError) {
        warn!("Tick {}: {} failed: {}", tick, what, error);
        self.reporter
            .warning(&format!("Warning: {} failed, retrying: {}", what, error));
    }

    async fn on_crash(
        &self,
        state: &mut RolloutState,
        crashes: Vec<CrashInfo>,
        origin: RolloutOrigin,
        last_health: Health,
    ) -> Result<RolloutReport, CliError> {
        let records: Vec<CrashRecord> = crashes
            .iter()
            .map(|crash| CrashRecord {
                instance_index: crash.instance_index,
                crashed_at: crash.since_ts,
            })
            .collect();
        state
            .process(RolloutEvent::Crashed(records))
            .map_err(CliError::Internal)?;

        let name = state.app_name().to_string();
        warn!("'{}' crashed {} time(s) during rollout", name, state.crash_set().len());
        self.reporter.error(&format!(
            "Error: Application '{}' failed to start, logs information below.",
            name
        ));
        for crash in state.crash_set() {
            self.reporter.trace(&format!(
                "  instance {} crashed at {}",
                crash.instance_index, crash.crashed_at
            ));
        }

        let instance = state.crash_set()[0].instance_index;
        let shown = show_crash_logs(
            self.client,
            self.reporter,
            &name,
            instance,
            &self.settings.crash_log_paths,
        )
        .await;
        if shown == 0 {
            self.reporter
                .line(&format!("No logs available for instance {}", instance));
        }

        let mut report = RolloutReport::from_state(state, last_health.to_string());
        if origin == RolloutOrigin::Push {
            report.rolled_back = self.offer_rollback(&name).await;
        }
        Ok(report)
    }

    async fn offer_rollback(&self, name: &str) -> bool {
        match self.prompt.confirm_delete(name).await {
            Ok(true) => match self.client.delete_app(name).await {
                Ok(()) => {
                    info!("Rolled back '{}'", name);
                    self.reporter
                        .line(&format!("Deleted application '{}'", name));
                    true
                }
                Err(e) => {
                    self.reporter
                        .warning(&format!("Failed to delete application '{}': {}", name, e));
                    false
                }
            },
            Ok(false) => false,
            Err(e) => {
                warn!("Rollback prompt failed: {}", e);
                false
            }
        }
    }

    async fn on_timeout(&self, state: &RolloutState, last_health: Health) -> RolloutReport {
        let name = state.app_name();
        match self.client.get_instances(name).await {
            Ok(instances) => {
                for instance in instances {
                    self.reporter.trace(&format!(
                        "  instance {}: {} (since {})",
                        instance.index, instance.state, instance.since
                    ));
                }
            }
            Err(e) => debug!("Could not list instances of '{}': {}", name, e),
        }

        warn!("Gave up on '{}' after {} ticks", name, state.tick_count());
        self.reporter.warning(&format!(
            "Application '{}' is taking too long to start ({}), check your logs",
            name, last_health
        ));
        RolloutReport::from_state(state, last_health.to_string())
    }
}
