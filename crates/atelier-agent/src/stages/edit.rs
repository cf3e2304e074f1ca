//! Applies model-proposed diffs to existing file content.

use crate::parser;
use crate::prompts::{EDIT_TEMPLATE, render_guidelines};
use crate::stages::DesignGuidelines;
use atelier_core::{Change, Error, Result, Task};
use atelier_patch::apply_all;
use atelier_providers::GenerationClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

/// Successful edit-stage output.
///
/// `failed` counts changes that found no match; the edit still succeeds
/// as long as the model proposed at least one change.
#[derive(Debug, Clone)]
pub struct EditOutput {
    /// File content after the applied changes.
    pub content: String,
    /// Model reasoning text.
    pub thinking: String,
    /// One-line summary for the context ledger.
    pub summary: String,
    /// Changes that applied cleanly.
    pub applied: usize,
    /// Changes that could not be matched.
    pub failed: usize,
}

/// Wire shape of the edit model's response.
#[derive(Debug, Default, Deserialize)]
struct EditResponse {
    #[serde(default)]
    thinking: String,
    #[serde(default)]
    changes: Vec<Change>,
    #[serde(default)]
    summary: String,
}

/// Edit stage: task plus current content in, patched content out.
pub struct EditStage {
    /// Shared generation client.
    client: Arc<GenerationClient>,
}

impl EditStage {
    /// Creates the stage over a shared client.
    pub fn new(client: Arc<GenerationClient>) -> Self {
        Self { client }
    }

    /// Asks for search/replace changes and applies them to
    /// `current_content`.
    ///
    /// # Errors
    /// Propagates generation failures; a response with zero changes is
    /// [`Error::EmptyChangeSet`]. Individual changes that fail to match
    /// are reported in the output counts, not as errors.
    pub async fn edit(
        &self,
        task: &Task,
        current_content: &str,
        context_summary: &str,
        guidelines: Option<&DesignGuidelines>,
    ) -> Result<EditOutput> {
        let prompt = EDIT_TEMPLATE
            .replace("{task_description}", &task.description)
            .replace("{file_path}", task.file.as_deref().unwrap_or_default())
            .replace("{design_guidelines}", &render_guidelines(guidelines))
            .replace("{current_content}", current_content)
            .replace("{context}", context_summary);

        let response = self.client.generate(&prompt).await?;
        let parsed: EditResponse = parser::decode(&response)?;

        if parsed.changes.is_empty() {
            return Err(Error::EmptyChangeSet);
        }

        let outcome = apply_all(current_content, &parsed.changes);
        if !outcome.failed.is_empty() {
            warn!(
                "{} of {} change(s) found no match in {}",
                outcome.failed.len(),
                parsed.changes.len(),
                task.file.as_deref().unwrap_or("<unknown>")
            );
        }

        Ok(EditOutput {
            content: outcome.content,
            thinking: parsed.thinking,
            summary: parsed.summary,
            applied: outcome.applied,
            failed: outcome.failed.len(),
        })
    }
}
