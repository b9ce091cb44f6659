//! Application and instance models

use serde::{Deserialize, Serialize};

/// Lifecycle state reported for an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppState {
    Started,
    Stopped,
    /// Any state string this client does not know about
    #[serde(other)]
    Unknown,
}

/// Memory and disk reservations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppResources {
    /// Memory per instance, in megabytes
    #[serde(default)]
    pub memory: u32,
}

/// Controller-side bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
}

/// Application as returned by `GET /apps/{name}` and sent back on update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub name: String,

    /// Absent while the controller has no opinion yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<AppState>,

    #[serde(default, rename = "instances")]
    pub expected_instances: u32,

    #[serde(
        default,
        rename = "runningInstances",
        skip_serializing_if = "Option::is_none"
    )]
    pub running_instances: Option<u32>,

    #[serde(default)]
    pub uris: Vec<String>,

    #[serde(default)]
    pub services: Vec<String>,

    #[serde(default)]
    pub resources: AppResources,

    #[serde(default)]
    pub meta: AppMeta,
}

impl AppSnapshot {
    pub fn is_started(&self) -> bool {
        self.state == Some(AppState::Started)
    }
}

/// Body of `POST /apps`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppManifest {
    pub name: String,
    pub instances: u32,
    pub state: AppState,
    pub uris: Vec<String>,
    pub resources: AppResources,
}

/// One running (or starting) copy of an application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub index: u32,
    pub state: String,
    /// Unix seconds
    #[serde(default)]
    pub since: i64,
}

/// `GET /apps/{name}/instances`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceListResponse {
    #[serde(default)]
    pub instances: Vec<InstanceInfo>,
}

/// A crash recorded by the health manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashInfo {
    #[serde(rename = "instance")]
    pub instance_index: u32,
    /// Unix seconds
    #[serde(rename = "since")]
    pub since_ts: i64,
}

/// `GET /apps/{name}/crashes`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrashListResponse {
    #[serde(default)]
    pub crashes: Vec<CrashInfo>,
}
