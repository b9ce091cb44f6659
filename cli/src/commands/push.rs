//! Push a new application

use std::path::PathBuf;

use controller_api::{AppManifest, AppResources, AppState};
use tracing::info;

use crate::commands::start::start_app;
use crate::commands::upload::{prepare_upload, send_upload};
use crate::commands::{CommandContext, Outcome};
use crate::errors::CliError;
use crate::rollout::fsm::RolloutOrigin;

/// Push options
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub app_name: String,
    pub path: PathBuf,
    pub instances: u32,
    /// Memory per instance, in megabytes
    pub memory_mb: u32,
    pub uris: Vec<String>,
    pub start_immediately: bool,
}

impl PushRequest {
    pub fn new(app_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            app_name: app_name.into(),
            path: path.into(),
            instances: 1,
            memory_mb: 256,
            uris: Vec::new(),
            start_immediately: true,
        }
    }
}

/// Create an application, upload its bits and (optionally) start it.
///
/// Packaging runs before the app is created so a bad tree never leaves a
/// half-made app behind. A crash during the first start offers a rollback.
pub async fn push(ctx: &CommandContext<'_>, request: &PushRequest) -> Result<Outcome, CliError> {
    let name = request.app_name.as_str();
    if request.instances == 0 {
        return Err(CliError::ConfigError(
            "Instance count must be at least 1".to_string(),
        ));
    }

    match ctx.client.get_app(name).await {
        Ok(_) => {
            return Err(CliError::AlreadyExists(format!(
                "Application '{}', use update to push new bits",
                name
            )))
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    let prepared = prepare_upload(ctx, name, &request.path).await?;

    let manifest = AppManifest {
        name: name.to_string(),
        instances: request.instances,
        state: AppState::Stopped,
        uris: request.uris.clone(),
        resources: AppResources {
            memory: request.memory_mb,
        },
    };
    ctx.reporter
        .progress(&format!("Creating Application '{}': ", name));
    ctx.client.create_app(&manifest).await?;
    ctx.reporter.ok("OK");
    info!("Created '{}' with {} instance(s)", name, request.instances);

    send_upload(ctx, name, prepared).await?;

    if !request.start_immediately {
        return Ok(Outcome::Uploaded {
            app_name: name.to_string(),
        });
    }

    start_app(ctx, name, RolloutOrigin::Push)
        .await
        .map(Outcome::Rollout)
}
