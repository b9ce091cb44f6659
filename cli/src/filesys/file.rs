//! Small async file handle used for configuration files

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::CliError;

#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Contents as UTF-8, or `None` when the file does not exist
    pub async fn read_optional(&self) -> Result<Option<String>, CliError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
