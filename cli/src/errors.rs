//! Error types for paasctl

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for paasctl
#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Application '{0}' state is undetermined, not enough information available")]
    HealthUnknown(String),

    #[error("Packaging error: {0}")]
    PackageError(String),

    #[error("Symlink {link} points outside the application root ({target})")]
    UnreachableLink { link: PathBuf, target: PathBuf },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Prompt error: {0}")]
    PromptError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Errors the rollout loop reports and rides out instead of aborting on
    pub fn is_transport(&self) -> bool {
        matches!(self, CliError::Transport(_) | CliError::HttpError(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CliError::NotFound(_))
    }
}

impl From<walkdir::Error> for CliError {
    fn from(err: walkdir::Error) -> Self {
        CliError::PackageError(err.to_string())
    }
}

impl From<zip::result::ZipError> for CliError {
    fn from(err: zip::result::ZipError) -> Self {
        CliError::PackageError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CliError {
    fn from(err: tokio::task::JoinError) -> Self {
        CliError::Internal(err.to_string())
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        CliError::PromptError(err.to_string())
    }
}
