//! Turns build or runtime errors into diff fixes.

use crate::parser;
use crate::prompts::ERROR_FIX_TEMPLATE;
use atelier_core::{Change, Error, Result};
use atelier_patch::apply_all;
use atelier_providers::GenerationClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

/// Successful error-recovery output.
#[derive(Debug, Clone)]
pub struct FixOutput {
    /// Model explanation of the error's cause.
    pub analysis: String,
    /// File content after the applied fix.
    pub content: String,
    /// Changes that applied cleanly.
    pub applied: usize,
    /// Changes that could not be matched.
    pub failed: usize,
}

/// Wire shape of the error model's response.
#[derive(Debug, Default, Deserialize)]
struct FixResponse {
    #[serde(default)]
    analysis: String,
    #[serde(default)]
    fix_type: String,
    #[serde(default)]
    changes: Vec<Change>,
}

/// Error-recovery stage: an error report in, a patched file out.
///
/// Shares the edit stage's diff path but is triggered by an external
/// error report instead of a planned task.
pub struct ErrorRecoveryStage {
    /// Shared generation client.
    client: Arc<GenerationClient>,
}

impl ErrorRecoveryStage {
    /// Creates the stage over a shared client.
    pub fn new(client: Arc<GenerationClient>) -> Self {
        Self { client }
    }

    /// Analyzes `error_message` against the file's current content and
    /// applies the proposed fix.
    ///
    /// # Errors
    /// Propagates generation failures; a response that is not a diff fix
    /// or carries zero changes is [`Error::EmptyChangeSet`].
    pub async fn analyze(
        &self,
        error_message: &str,
        file: &str,
        current_content: &str,
    ) -> Result<FixOutput> {
        let prompt = ERROR_FIX_TEMPLATE
            .replace("{error_message}", error_message)
            .replace("{file_path}", file)
            .replace("{current_content}", current_content);

        let response = self.client.generate(&prompt).await?;
        let parsed: FixResponse = parser::decode(&response)?;

        if parsed.fix_type != "diff" || parsed.changes.is_empty() {
            return Err(Error::EmptyChangeSet);
        }

        let outcome = apply_all(current_content, &parsed.changes);
        if !outcome.failed.is_empty() {
            warn!(
                "{} of {} fix change(s) found no match in {file}",
                outcome.failed.len(),
                parsed.changes.len()
            );
        }

        Ok(FixOutput {
            analysis: parsed.analysis,
            content: outcome.content,
            applied: outcome.applied,
            failed: outcome.failed.len(),
        })
    }
}
