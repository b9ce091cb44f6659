//! Where paasctl keeps its configuration and logs

use std::ffi::OsString;
use std::path::PathBuf;

use crate::filesys::file::File;

/// Environment variable overriding the configuration directory
pub const HOME_ENV: &str = "PAASCTL_HOME";

const DEFAULT_DIR_NAME: &str = ".paasctl";

#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `$PAASCTL_HOME` when set, otherwise `.paasctl` under the user's home
    /// (or the working directory when no home can be determined)
    pub fn resolve(override_dir: Option<OsString>, user_home: Option<PathBuf>) -> Self {
        match override_dir.filter(|dir| !dir.is_empty()) {
            Some(dir) => Self::new(dir),
            None => Self::new(
                user_home
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(DEFAULT_DIR_NAME),
            ),
        }
    }

    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    /// Destination of the optional rolling log file
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        let user_home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from);
        Self::resolve(std::env::var_os(HOME_ENV), user_home)
    }
}
