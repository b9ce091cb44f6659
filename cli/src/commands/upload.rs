//! Reconcile, package and upload application bits

use std::path::Path;

use controller_api::ResourceFingerprint;
use tracing::info;

use crate::commands::CommandContext;
use crate::errors::CliError;
use crate::filesys::scratch::ScratchDir;
use crate::package::archive::{build_archive, PackagedArchive};
use crate::package::exclusions::NoiseFilter;
use crate::package::stage::stage_application;
use crate::rollout::ticker::with_ticker;
use crate::sync::reconciler::{reconcile, scan_tree};
use crate::utils::pretty_size;

/// An archive ready to ship, plus what the controller can reuse
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub archive: PackagedArchive,
    pub reused: Vec<ResourceFingerprint>,
    pub total_size: u64,
}

/// Stage, fingerprint, reconcile and package `path`.
///
/// Makes no remote changes, so a failure here leaves the controller untouched.
/// The scratch directory is gone by the time this returns, whatever the result.
pub async fn prepare_upload(
    ctx: &CommandContext<'_>,
    app_name: &str,
    path: &Path,
) -> Result<PreparedUpload, CliError> {
    ctx.reporter.line("Uploading Application:");
    let scratch = ScratchDir::for_app(app_name, ctx.settings.scratch_root.as_deref())?;

    let staged = scratch.path().to_path_buf();
    let source = path.to_path_buf();
    let entries = tokio::task::spawn_blocking(move || {
        stage_application(&source, &staged)?;
        scan_tree(&staged)
    })
    .await??;

    ctx.reporter.progress("  Checking for available resources: ");
    let reconciliation = reconcile(
        ctx.client,
        entries,
        &ctx.settings.reconcile,
        &ctx.sleep_fn,
    )
    .await;
    ctx.reporter.ok("OK");

    ctx.reporter.progress("  Packing application: ");
    let noise = NoiseFilter::standard()?;
    let to_send = reconciliation.to_send;
    let archive = tokio::task::spawn_blocking(move || build_archive(&to_send, &noise)).await??;
    ctx.reporter.ok("OK");

    drop(scratch);

    info!(
        "Prepared '{}': {} files packed, {} reused, {} excluded",
        app_name,
        archive.entries.len(),
        reconciliation.reused.len(),
        archive.excluded.len()
    );

    Ok(PreparedUpload {
        archive,
        reused: reconciliation.reused,
        total_size: reconciliation.total_size,
    })
}

/// Ship a prepared archive to the controller
pub async fn send_upload(
    ctx: &CommandContext<'_>,
    app_name: &str,
    prepared: PreparedUpload,
) -> Result<(), CliError> {
    ctx.reporter.progress(&format!(
        "  Uploading ({}): ",
        pretty_size(prepared.archive.size())
    ));
    with_ticker(
        ctx.ticker.as_ref(),
        ctx.client
            .upload_app(app_name, prepared.archive.bytes, &prepared.reused),
    )
    .await?;
    ctx.reporter.ok("OK");
    Ok(())
}

/// Prepare and send in one step
pub async fn upload_app_bits(
    ctx: &CommandContext<'_>,
    app_name: &str,
    path: &Path,
) -> Result<(), CliError> {
    let prepared = prepare_upload(ctx, app_name, path).await?;
    send_upload(ctx, app_name, prepared).await
}
