//! Update an existing application

use std::path::Path;

use crate::commands::start::restart;
use crate::commands::upload::upload_app_bits;
use crate::commands::{CommandContext, Outcome};
use crate::errors::CliError;

/// Upload new bits and restart the app if it was running
pub async fn update(
    ctx: &CommandContext<'_>,
    app_name: &str,
    path: &Path,
) -> Result<Outcome, CliError> {
    let app = ctx.client.get_app(app_name).await?;

    upload_app_bits(ctx, app_name, path).await?;

    if app.is_started() {
        restart(ctx, app_name).await
    } else {
        Ok(Outcome::Uploaded {
            app_name: app_name.to_string(),
        })
    }
}
