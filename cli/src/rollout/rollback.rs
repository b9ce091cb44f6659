//! Rollback decision point offered when a freshly pushed app crashes

use async_trait::async_trait;

use crate::errors::CliError;

/// Decides whether a crashed, freshly pushed application should be deleted
#[async_trait]
pub trait RollbackPrompt: Send + Sync {
    async fn confirm_delete(&self, app_name: &str) -> Result<bool, CliError>;
}

/// Always gives the same answer; used for `--rollback=yes|no` and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl RollbackPrompt for FixedAnswer {
    async fn confirm_delete(&self, _app_name: &str) -> Result<bool, CliError> {
        Ok(self.0)
    }
}
