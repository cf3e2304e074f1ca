//! Generates complete file content for create tasks.

use crate::parser;
use crate::prompts::{CREATE_TEMPLATE, render_guidelines};
use crate::stages::DesignGuidelines;
use atelier_core::{Error, Result, Task};
use atelier_providers::GenerationClient;
use serde::Deserialize;
use std::sync::Arc;

/// Successful create-stage output.
#[derive(Debug, Clone)]
pub struct CreateOutput {
    /// Complete content of the new file.
    pub content: String,
    /// Model reasoning text.
    pub thinking: String,
    /// One-line summary for the context ledger.
    pub summary: String,
}

/// Wire shape of the create model's response.
#[derive(Debug, Default, Deserialize)]
struct CreateResponse {
    #[serde(default)]
    thinking: String,
    #[serde(default)]
    file_content: String,
    #[serde(default)]
    summary: String,
}

/// Create stage: one file task in, full file content out.
pub struct CreateStage {
    /// Shared generation client.
    client: Arc<GenerationClient>,
}

impl CreateStage {
    /// Creates the stage over a shared client.
    pub fn new(client: Arc<GenerationClient>) -> Self {
        Self { client }
    }

    /// Generates content for the task's target file.
    ///
    /// # Errors
    /// Propagates generation failures; a response that parses but
    /// carries no file content is [`Error::MalformedResponse`].
    pub async fn create(
        &self,
        task: &Task,
        context_summary: &str,
        guidelines: Option<&DesignGuidelines>,
    ) -> Result<CreateOutput> {
        let prompt = CREATE_TEMPLATE
            .replace("{task_description}", &task.description)
            .replace("{file_path}", task.file.as_deref().unwrap_or_default())
            .replace("{design_guidelines}", &render_guidelines(guidelines))
            .replace("{context}", context_summary);

        let response = self.client.generate(&prompt).await?;
        let parsed: CreateResponse = parser::decode(&response)?;

        if parsed.file_content.is_empty() {
            return Err(Error::MalformedResponse(
                "model returned no file content".to_owned(),
            ));
        }

        Ok(CreateOutput {
            content: parsed.file_content,
            thinking: parsed.thinking,
            summary: parsed.summary,
        })
    }
}
