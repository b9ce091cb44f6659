//! Resource fingerprint models

use serde::{Deserialize, Serialize};

/// A file fingerprint as understood by `POST /resources`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceFingerprint {
    pub size: u64,
    pub sha1: String,
    /// Path relative to the application root
    #[serde(rename = "fn")]
    pub path: String,
}

impl ResourceFingerprint {
    /// Key used to decide whether two files carry the same content
    pub fn content_key(&self) -> (&str, u64) {
        (&self.sha1, self.size)
    }
}
