//! Start, stop and restart

use chrono::Utc;
use controller_api::AppState;
use tracing::info;

use crate::commands::{CommandContext, Outcome};
use crate::errors::CliError;
use crate::rollout::fsm::{AbortReason, RolloutEvent, RolloutOrigin, RolloutState};
use crate::rollout::health::HealthSample;
use crate::rollout::supervisor::RolloutReport;
use crate::rollout::ticker::with_ticker;

/// Start an application and supervise its rollout
pub async fn start(ctx: &CommandContext<'_>, app_name: &str) -> Result<Outcome, CliError> {
    start_app(ctx, app_name, RolloutOrigin::Restart)
        .await
        .map(Outcome::Rollout)
}

/// Stop then start
pub async fn restart(ctx: &CommandContext<'_>, app_name: &str) -> Result<Outcome, CliError> {
    stop(ctx, app_name).await?;
    start(ctx, app_name).await
}

/// Flip an application to STOPPED
pub async fn stop(ctx: &CommandContext<'_>, app_name: &str) -> Result<Outcome, CliError> {
    let mut app = ctx.client.get_app(app_name).await?;
    if app.state == Some(AppState::Stopped) {
        ctx.reporter
            .warning(&format!("Application '{}' already stopped", app_name));
        return Ok(Outcome::Stopped {
            app_name: app_name.to_string(),
        });
    }

    app.state = Some(AppState::Stopped);
    ctx.reporter
        .progress(&format!("Stopping Application '{}': ", app_name));
    with_ticker(ctx.ticker.as_ref(), ctx.client.update_app(app_name, &app)).await?;
    ctx.reporter.ok("OK");

    Ok(Outcome::Stopped {
        app_name: app_name.to_string(),
    })
}

fn aborted(
    ctx: &CommandContext<'_>,
    mut state: RolloutState,
    reason: AbortReason,
    final_status: String,
) -> Result<RolloutReport, CliError> {
    let name = state.app_name().to_string();
    match reason {
        AbortReason::NotFound => ctx
            .reporter
            .error(&format!("Application '{}' could not be found", name)),
        AbortReason::AlreadyStarted => ctx
            .reporter
            .warning(&format!("Application '{}' already started", name)),
    }
    state
        .process(RolloutEvent::Abort(reason))
        .map_err(CliError::Internal)?;
    Ok(RolloutReport::from_state(&state, final_status))
}

/// The rollout entry point shared by start, restart, update and push
pub async fn start_app(
    ctx: &CommandContext<'_>,
    app_name: &str,
    origin: RolloutOrigin,
) -> Result<RolloutReport, CliError> {
    let mut state = RolloutState::new(app_name, Utc::now());

    let mut app = match ctx.client.get_app(app_name).await {
        Ok(app) => app,
        Err(e) if e.is_not_found() => {
            return aborted(ctx, state, AbortReason::NotFound, "N/A".to_string());
        }
        Err(e) => return Err(e),
    };

    if app.is_started() {
        let health = HealthSample::from_snapshot(&app).health.to_string();
        return aborted(ctx, state, AbortReason::AlreadyStarted, health);
    }

    app.state = Some(AppState::Started);
    ctx.reporter
        .progress(&format!("Staging Application '{}': ", app_name));
    with_ticker(ctx.ticker.as_ref(), ctx.client.update_app(app_name, &app)).await?;
    ctx.reporter.ok("OK");
    state
        .process(RolloutEvent::Acknowledged)
        .map_err(CliError::Internal)?;

    info!("Start of '{}' acknowledged ({:?})", app_name, origin);
    ctx.reporter
        .line(&format!("Starting Application '{}'", app_name));
    ctx.supervisor().await_health(&mut state, origin).await
}
