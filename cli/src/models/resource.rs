//! Local file fingerprints

use std::path::PathBuf;

use controller_api::ResourceFingerprint;

/// A regular file found under the application root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileEntry {
    /// Path relative to the root, always `/`-separated
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub size_bytes: u64,
    /// Lowercase hex SHA-1 of the contents
    pub content_digest: String,
}

impl LocalFileEntry {
    pub fn fingerprint(&self) -> ResourceFingerprint {
        ResourceFingerprint {
            size: self.size_bytes,
            sha1: self.content_digest.clone(),
            path: self.relative_path.clone(),
        }
    }

    pub fn content_key(&self) -> (&str, u64) {
        (&self.content_digest, self.size_bytes)
    }
}

/// Total bytes across a set of entries
pub fn total_size(entries: &[LocalFileEntry]) -> u64 {
    entries.iter().map(|e| e.size_bytes).sum()
}
