//! Controller client abstraction
//!
//! Everything the push and rollout pipeline needs from the remote controller.
//! `HttpClient` implements it against the REST API; tests substitute a
//! scripted in-memory controller.

use async_trait::async_trait;
use controller_api::{AppManifest, AppSnapshot, CrashInfo, InstanceInfo, ResourceFingerprint};

use crate::errors::CliError;

#[async_trait]
pub trait ControllerClient: Send + Sync {
    /// Fetch an application. Fails with `NotFound` when it does not exist.
    async fn get_app(&self, name: &str) -> Result<AppSnapshot, CliError>;

    /// Create a new application from a manifest
    async fn create_app(&self, manifest: &AppManifest) -> Result<(), CliError>;

    /// Persist state and attribute changes. Synchronous on the controller side.
    async fn update_app(&self, name: &str, app: &AppSnapshot) -> Result<(), CliError>;

    /// Return the subset of `fingerprints` the controller already holds
    async fn check_resources(
        &self,
        fingerprints: &[ResourceFingerprint],
    ) -> Result<Vec<ResourceFingerprint>, CliError>;

    /// Upload the application archive plus the resources to reuse server-side
    async fn upload_app(
        &self,
        name: &str,
        archive: Vec<u8>,
        reused: &[ResourceFingerprint],
    ) -> Result<(), CliError>;

    async fn get_instances(&self, name: &str) -> Result<Vec<InstanceInfo>, CliError>;

    /// Crashes recorded at or after `since_ts` (unix seconds)
    async fn get_crashes(&self, name: &str, since_ts: i64) -> Result<Vec<CrashInfo>, CliError>;

    /// Fetch a file from an instance's sandbox. `NotFound` for missing paths.
    async fn get_file(&self, name: &str, path: &str, instance_index: u32)
        -> Result<Vec<u8>, CliError>;

    async fn delete_app(&self, name: &str) -> Result<(), CliError>;
}
