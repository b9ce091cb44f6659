//! Settings file management

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::debug;

use crate::commands::CommandSettings;
use crate::errors::CliError;
use crate::filesys::file::File;
use crate::logs::LogLevel;
use crate::output::OutputConfig;
use crate::rollout::supervisor::SupervisorSettings;
use crate::sync::reconciler::{ReconcileOptions, DEFAULT_RESOURCE_CHECK_THRESHOLD};

/// Client settings
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Write daily-rolling logs here as well as stderr
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Controller base URL
    #[serde(default = "default_target")]
    pub target: String,

    /// Authorization token sent to the controller
    #[serde(default, deserialize_with = "deserialize_token")]
    pub token: Option<SecretString>,

    /// Colour status output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Show controller payload details
    #[serde(default)]
    pub trace: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Ask the controller which files it already has
    #[serde(default = "default_true")]
    pub check_resources: bool,

    /// Trees smaller than this are uploaded whole without asking
    #[serde(default = "default_resource_check_threshold")]
    pub resource_check_threshold: u64,

    /// Rollout polling configuration
    #[serde(default)]
    pub supervisor: SupervisorSettings,
}

fn deserialize_token<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let token: Option<String> = Option::deserialize(deserializer)?;
    Ok(token.filter(|t| !t.is_empty()).map(SecretString::from))
}

fn default_true() -> bool {
    true
}

fn default_target() -> String {
    "http://api.vcap.me".to_string()
}

fn default_http_timeout() -> u64 {
    30
}

fn default_resource_check_threshold() -> u64 {
    DEFAULT_RESOURCE_CHECK_THRESHOLD
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_dir: None,
            target: default_target(),
            token: None,
            color: true,
            trace: false,
            http_timeout_secs: default_http_timeout(),
            check_resources: true,
            resource_check_threshold: default_resource_check_threshold(),
            supervisor: SupervisorSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file does not exist
    pub async fn load(file: &File) -> Result<Self, CliError> {
        let Some(contents) = file.read_optional().await? else {
            debug!("No settings at {}, using defaults", file.path().display());
            return Ok(Self::default());
        };

        serde_json::from_str(&contents).map_err(|e| {
            CliError::ConfigError(format!("{}: {}", file.path().display(), e))
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            color: self.color,
            trace: self.trace,
        }
    }

    pub fn command_settings(&self) -> CommandSettings {
        CommandSettings {
            supervisor: self.supervisor.clone(),
            reconcile: ReconcileOptions {
                threshold: self.resource_check_threshold,
                check_resources: self.check_resources,
                ..Default::default()
            },
            scratch_root: None,
        }
    }
}
