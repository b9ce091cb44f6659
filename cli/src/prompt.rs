//! Interactive rollback confirmation

use async_trait::async_trait;
use dialoguer::Confirm;

use crate::errors::CliError;
use crate::rollout::rollback::RollbackPrompt;

/// Asks the operator on the terminal, defaulting to yes
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompt;

#[async_trait]
impl RollbackPrompt for DialoguerPrompt {
    async fn confirm_delete(&self, app_name: &str) -> Result<bool, CliError> {
        let question = format!("Should I delete the application '{}'?", app_name);
        // Reading the terminal blocks until the operator answers
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new().with_prompt(question).default(true).interact()
        })
        .await??;
        Ok(answer)
    }
}
