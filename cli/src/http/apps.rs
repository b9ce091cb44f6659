//! Application API client

use async_trait::async_trait;
use controller_api::{
    AppManifest, AppSnapshot, CrashInfo, CrashListResponse, InstanceInfo, InstanceListResponse,
    ResourceFingerprint,
};
use reqwest::multipart::{Form, Part};

use crate::controller::ControllerClient;
use crate::errors::CliError;
use crate::http::client::HttpClient;

/// Segments of an instance file URL. The app name stays one segment; the
/// file path keeps its directory structure.
fn file_segments<'a>(name: &'a str, path: &'a str, instance: &'a str) -> Vec<&'a str> {
    let mut segments = vec!["apps", name, "instances", instance, "files"];
    segments.extend(path.split('/').filter(|part| !part.is_empty()));
    segments
}

#[async_trait]
impl ControllerClient for HttpClient {
    async fn get_app(&self, name: &str) -> Result<AppSnapshot, CliError> {
        self.get(&["apps", name])
            .await
            .map_err(|e| match e {
                CliError::NotFound(_) => CliError::NotFound(format!("Application '{}'", name)),
                other => other,
            })
    }

    async fn create_app(&self, manifest: &AppManifest) -> Result<(), CliError> {
        self.post_discard(&["apps"], manifest).await
    }

    async fn update_app(&self, name: &str, app: &AppSnapshot) -> Result<(), CliError> {
        self.put(&["apps", name], app).await
    }

    async fn check_resources(
        &self,
        fingerprints: &[ResourceFingerprint],
    ) -> Result<Vec<ResourceFingerprint>, CliError> {
        self.post(&["resources"], fingerprints).await
    }

    async fn upload_app(
        &self,
        name: &str,
        archive: Vec<u8>,
        reused: &[ResourceFingerprint],
    ) -> Result<(), CliError> {
        let application = Part::bytes(archive)
            .file_name(format!("{}.zip", name))
            .mime_str("application/zip")?;
        let form = Form::new()
            .text("_method", "put")
            .text("resources", serde_json::to_string(reused)?)
            .part("application", application);

        self.put_multipart(&["apps", name, "application"], form)
            .await
    }

    async fn get_instances(&self, name: &str) -> Result<Vec<InstanceInfo>, CliError> {
        let response: InstanceListResponse = self.get(&["apps", name, "instances"]).await?;
        Ok(response.instances)
    }

    async fn get_crashes(&self, name: &str, since_ts: i64) -> Result<Vec<CrashInfo>, CliError> {
        let response: CrashListResponse = self.get(&["apps", name, "crashes"]).await?;
        Ok(response
            .crashes
            .into_iter()
            .filter(|crash| crash.since_ts >= since_ts)
            .collect())
    }

    async fn get_file(
        &self,
        name: &str,
        path: &str,
        instance_index: u32,
    ) -> Result<Vec<u8>, CliError> {
        let instance = instance_index.to_string();
        self.get_bytes(&file_segments(name, path, &instance)).await
    }

    async fn delete_app(&self, name: &str) -> Result<(), CliError> {
        self.delete(&["apps", name]).await
    }
}
