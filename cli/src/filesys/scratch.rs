//! Scratch directory owned by a single packaging operation

use std::path::Path;

use tempfile::{Builder, TempDir};
use tracing::{debug, warn};

use crate::errors::CliError;

/// A uniquely named directory that exists for the lifetime of this guard.
///
/// Two operations on the same application never share a path, and the whole
/// tree is removed when the guard drops, on success and error paths alike.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    /// Fresh `.paasctl_<app>_XXXXXX` directory under `root` (the system temp dir by default)
    pub fn for_app(app_name: &str, root: Option<&Path>) -> Result<Self, CliError> {
        let prefix = format!(".paasctl_{}_", sanitize(app_name));
        let mut builder = Builder::new();
        builder.prefix(&prefix);
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        debug!("Created scratch directory {}", dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => debug!("Removed scratch directory {}", path.display()),
            Err(e) => warn!("Failed to remove scratch directory {}: {}", path.display(), e),
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
