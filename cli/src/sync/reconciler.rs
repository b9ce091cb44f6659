//! Fingerprint reconciler
//!
//! Fingerprints every regular file of an application tree and asks the
//! controller which of them it already holds, so only new content travels.

use std::collections::HashSet;
use std::path::{Component, Path};

use controller_api::ResourceFingerprint;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::controller::ControllerClient;
use crate::errors::CliError;
use crate::models::resource::{total_size, LocalFileEntry};
use crate::utils::{calc_exp_backoff, sha1_file, CooldownOptions, SleepFn};

/// Below this many bytes the resource check costs more than it saves
pub const DEFAULT_RESOURCE_CHECK_THRESHOLD: u64 = 64 * 1024;

/// Reconciler options
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Aggregate size under which no round trip is made
    pub threshold: u64,

    /// Set to false to always send everything
    pub check_resources: bool,

    /// Extra attempts after a transport failure
    pub retries: u32,

    /// Delay between attempts
    pub cooldown: CooldownOptions,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_RESOURCE_CHECK_THRESHOLD,
            check_resources: true,
            retries: 2,
            cooldown: CooldownOptions::default(),
        }
    }
}

/// Outcome of a reconciliation
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Files that must be packaged and uploaded
    pub to_send: Vec<LocalFileEntry>,

    /// Files the controller already holds, by their local paths
    pub reused: Vec<ResourceFingerprint>,

    /// Aggregate size of the whole tree
    pub total_size: u64,

    /// Whether the controller was consulted
    pub round_trip: bool,
}

impl Reconciliation {
    fn send_everything(entries: Vec<LocalFileEntry>, total_size: u64, round_trip: bool) -> Self {
        Self {
            to_send: entries,
            reused: Vec::new(),
            total_size,
            round_trip,
        }
    }
}

/// Relative path with `/` separators regardless of platform
pub fn relative_key(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Fingerprint every regular file under `root`, hidden files included.
///
/// Symlinks are not followed and non-regular files (sockets, fifos) are
/// skipped. Entries come back sorted by path.
pub fn scan_tree(root: &Path) -> Result<Vec<LocalFileEntry>, CliError> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .map_err(|e| CliError::Internal(format!("{}: {}", path.display(), e)))?;
        let size_bytes = entry.metadata()?.len();
        let content_digest = sha1_file(path)?;

        debug!("Fingerprinted {} ({} bytes, {})", rel.display(), size_bytes, content_digest);

        entries.push(LocalFileEntry {
            relative_path: relative_key(rel),
            absolute_path: path.to_path_buf(),
            size_bytes,
            content_digest,
        });
    }

    Ok(entries)
}

/// Split `entries` into what must be sent and what the controller can reuse.
///
/// Best effort: any failure of the round trip means "nothing can be reused"
/// and every entry is sent.
pub async fn reconcile(
    client: &dyn ControllerClient,
    entries: Vec<LocalFileEntry>,
    options: &ReconcileOptions,
    sleep_fn: &SleepFn,
) -> Reconciliation {
    let total = total_size(&entries);

    if !options.check_resources {
        debug!("Resource check disabled, sending {} files", entries.len());
        return Reconciliation::send_everything(entries, total, false);
    }

    if total < options.threshold {
        debug!(
            "Tree is {} bytes (< {}), skipping resource check",
            total, options.threshold
        );
        return Reconciliation::send_everything(entries, total, false);
    }

    let fingerprints: Vec<ResourceFingerprint> =
        entries.iter().map(LocalFileEntry::fingerprint).collect();

    let present = match check_with_retry(client, &fingerprints, options, sleep_fn).await {
        Ok(present) => present,
        Err(e) => {
            warn!("Resource check failed, uploading everything: {}", e);
            return Reconciliation::send_everything(entries, total, true);
        }
    };

    let present_keys: HashSet<(&str, u64)> =
        present.iter().map(ResourceFingerprint::content_key).collect();

    let (reused, to_send): (Vec<LocalFileEntry>, Vec<LocalFileEntry>) = entries
        .into_iter()
        .partition(|entry| present_keys.contains(&entry.content_key()));

    info!(
        "Resource check: {} of {} files already present on the controller",
        reused.len(),
        reused.len() + to_send.len()
    );

    Reconciliation {
        to_send,
        reused: reused.iter().map(LocalFileEntry::fingerprint).collect(),
        total_size: total,
        round_trip: true,
    }
}

async fn check_with_retry(
    client: &dyn ControllerClient,
    fingerprints: &[ResourceFingerprint],
    options: &ReconcileOptions,
    sleep_fn: &SleepFn,
) -> Result<Vec<ResourceFingerprint>, CliError> {
    let mut attempt = 0;
    loop {
        match client.check_resources(fingerprints).await {
            Ok(present) => return Ok(present),
            Err(e) if e.is_transport() && attempt < options.retries => {
                let delay = calc_exp_backoff(&options.cooldown, attempt);
                debug!("Resource check attempt {} failed, retrying in {:?}: {}", attempt + 1, delay, e);
                attempt += 1;
                sleep_fn(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
