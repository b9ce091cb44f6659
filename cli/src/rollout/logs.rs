//! Remote log retrieval for rollouts

use tracing::debug;

use crate::controller::ControllerClient;
use crate::errors::CliError;
use crate::output::Reporter;

/// Files worth showing after a crash, in display order
pub const CRASH_LOG_PATHS: &[&str] = &[
    "logs/err.log",
    "logs/staging.log",
    "app/logs/stderr.log",
    "app/logs/stdout.log",
    "app/logs/startup.log",
    "app/logs/migration.log",
];

/// Log streamed while an app is slow to start
pub const STARTUP_LOG_PATH: &str = "logs/startup.log";

fn display_logfile(reporter: &Reporter, path: &str, instance_index: u32, content: &str) {
    reporter.line(&format!("====> /{} (instance {}) <====\n", path, instance_index));
    for line in content.lines() {
        reporter.line(line);
    }
    reporter.line("");
}

/// Fetch and print every crash log an instance has. Missing files are
/// skipped silently; returns how many files were shown.
pub async fn show_crash_logs(
    client: &dyn ControllerClient,
    reporter: &Reporter,
    app_name: &str,
    instance_index: u32,
    paths: &[String],
) -> usize {
    let mut shown = 0;
    for path in paths {
        match client.get_file(app_name, path, instance_index).await {
            Ok(content) if content.is_empty() => {}
            Ok(content) => {
                display_logfile(
                    reporter,
                    path,
                    instance_index,
                    &String::from_utf8_lossy(&content),
                );
                shown += 1;
            }
            Err(e) => debug!("No {} for instance {}: {}", path, instance_index, e),
        }
    }
    shown
}

/// Incremental tail of a remote log, tracked by a line offset so nothing is
/// shown twice. A log that shrinks below the offset was replaced, and is
/// shown again from its first line.
#[derive(Debug, Default)]
pub struct LogTail {
    offset: usize,
    header_shown: bool,
}

impl LogTail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines displayed so far
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Show lines added since the last poll. A missing file is not an error.
    pub async fn poll(
        &mut self,
        client: &dyn ControllerClient,
        reporter: &Reporter,
        app_name: &str,
        path: &str,
    ) -> Result<usize, CliError> {
        let content = match client.get_file(app_name, path, 0).await {
            Ok(content) => content,
            Err(e) if e.is_not_found() => return Ok(0),
            Err(e) => return Err(e),
        };

        let text = String::from_utf8_lossy(&content);
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() < self.offset {
            debug!(
                "{} shrank from {} to {} lines, restarting tail",
                path,
                self.offset,
                lines.len()
            );
            self.offset = 0;
        }
        if lines.len() == self.offset {
            return Ok(0);
        }

        if !self.header_shown {
            reporter.line("\n==== displaying startup log ====\n");
            self.header_shown = true;
        }
        let fresh = &lines[self.offset..];
        for line in fresh {
            reporter.line(line);
        }
        self.offset = lines.len();
        Ok(fresh.len())
    }
}
