//! Crash log retrieval

use crate::commands::{CommandContext, Outcome};
use crate::errors::CliError;
use crate::rollout::logs::show_crash_logs;

/// Print the crash logs of one instance
pub async fn crash_logs(
    ctx: &CommandContext<'_>,
    app_name: &str,
    instance_index: u32,
) -> Result<Outcome, CliError> {
    ctx.client.get_app(app_name).await?;

    let shown = show_crash_logs(
        ctx.client,
        ctx.reporter,
        app_name,
        instance_index,
        &ctx.settings.supervisor.crash_log_paths,
    )
    .await;
    if shown == 0 {
        ctx.reporter
            .line(&format!("No logs available for instance {}", instance_index));
    }

    Ok(Outcome::Logs {
        app_name: app_name.to_string(),
        shown,
    })
}
