//! Produces styling guidelines for UI component tasks.

use crate::parser;
use crate::prompts::DESIGN_TEMPLATE;
use atelier_core::{Result, Task};
use atelier_providers::GenerationClient;
use serde::Deserialize;
use std::sync::Arc;

/// Styling guidance consumed as extra prompt context by the create and
/// edit stages. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignGuidelines {
    /// Concrete styling rules, one per entry.
    pub guidelines: Vec<String>,
    /// Import lines worth adding to the generated component.
    pub suggested_imports: Vec<String>,
    /// Free-form palette note.
    pub color_palette: Option<String>,
}

/// Wire shape of the design model's response.
#[derive(Debug, Default, Deserialize)]
struct DesignResponse {
    #[serde(default)]
    design_guidelines: Vec<String>,
    #[serde(default)]
    suggested_imports: Vec<String>,
    #[serde(default)]
    color_palette_suggestions: Option<String>,
}

/// Design stage: one task in, styling guidance out.
pub struct DesignStage {
    /// Shared generation client.
    client: Arc<GenerationClient>,
}

impl DesignStage {
    /// Creates the stage over a shared client.
    pub fn new(client: Arc<GenerationClient>) -> Self {
        Self { client }
    }

    /// Asks for guidelines covering the given task.
    ///
    /// # Errors
    /// Propagates generation failures and malformed output; the caller
    /// treats any error as "no guidelines" rather than failing the task.
    pub async fn guidelines(&self, task: &Task) -> Result<DesignGuidelines> {
        let prompt = DESIGN_TEMPLATE
            .replace("{task_description}", &task.description)
            .replace("{file_path}", task.file.as_deref().unwrap_or_default());

        let response = self.client.generate(&prompt).await?;
        let parsed: DesignResponse = parser::decode(&response)?;
        Ok(DesignGuidelines {
            guidelines: parsed.design_guidelines,
            suggested_imports: parsed.suggested_imports,
            color_palette: parsed.color_palette_suggestions,
        })
    }
}
