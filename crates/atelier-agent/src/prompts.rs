//! Prompt templates and bounded context assembly.
//!
//! Templates carry `{placeholder}` markers filled by simple substitution.
//! The surrounding context sections are size-capped here so a long
//! session can never grow a prompt without bound.

use crate::stages::DesignGuidelines;
use atelier_core::{ContextConfig, ContextEntry, ProjectFiles};
use std::collections::HashMap;

/// Instruction template for the planning stage.
pub const PLANNING_TEMPLATE: &str = "\
You are an expert AI coding assistant that plans UI development work.

Given a user request:
1. Analyze what they want to build or fix
2. Read the provided file contents to understand the current code
3. Break the work into file-by-file tasks
4. Ask for clarification only when you cannot infer the intent

OUTPUT FORMAT (JSON only):
{
  \"understanding\": \"What the user wants\",
  \"needs_clarification\": false,
  \"clarification_question\": \"Question for the user, when needed\",
  \"tasks\": [
    {
      \"id\": 1,
      \"type\": \"file\",
      \"description\": \"What this task does\",
      \"file\": \"src/components/Example.jsx\",
      \"action\": \"create\",
      \"command\": null,
      \"dependencies\": []
    }
  ],
  \"estimated_complexity\": \"simple\"
}

RULES:
- Each task touches exactly one file
- Order shared components first, the entry file last
- File paths always start with src/
- Use \"command\" tasks only for package installs";

/// Instruction template for the design stage.
pub const DESIGN_TEMPLATE: &str = "\
You are an expert UI designer reviewing a planned change.

TASK: {task_description}
FILE: {file_path}

Provide guidelines that keep the result consistent, responsive, and
accessible, using TailwindCSS utilities and the project's UI kit.

OUTPUT FORMAT (JSON only):
{
  \"design_guidelines\": [\"One concrete styling rule per entry\"],
  \"suggested_imports\": [\"import { Card } from '@/components/ui/card'\"],
  \"color_palette_suggestions\": \"Short palette note\"
}";

/// Instruction template for the create stage.
pub const CREATE_TEMPLATE: &str = "\
You are an expert React developer. Create a new file.

TASK: {task_description}
FILE: {file_path}

DESIGN GUIDELINES:
{design_guidelines}

PREVIOUS CHANGES CONTEXT:
{context}

OUTPUT FORMAT (JSON only):
{
  \"thinking\": \"Brief explanation of your approach\",
  \"file_content\": \"The complete file content\",
  \"summary\": \"One-line summary of what the file does\"
}

RULES:
- Plain JSX, no TypeScript annotations
- TailwindCSS for styling, UI kit imports from '@/components/ui/'
- Export the component as default";

/// Instruction template for the edit stage.
pub const EDIT_TEMPLATE: &str = "\
You are an expert React developer. You are updating a file.

TASK: {task_description}
FILE: {file_path}

DESIGN GUIDELINES:
{design_guidelines}

CURRENT FILE CONTENT:
```
{current_content}
```

PREVIOUS CHANGES CONTEXT:
{context}

OUTPUT FORMAT (JSON only) using search/replace blocks:
{
  \"thinking\": \"Brief explanation of your approach\",
  \"changes\": [
    {
      \"search\": \"EXACT code block to find, copied character for character\",
      \"replace\": \"The new code\"
    }
  ],
  \"summary\": \"One-line summary of changes made\"
}

RULES:
- Each search block must match existing code exactly, whitespace included
- Include enough surrounding lines to make each search unique
- Use one search/replace object per distinct edit";

/// Instruction template for the error-recovery stage.
pub const ERROR_FIX_TEMPLATE: &str = "\
You are an expert React developer. A build or runtime error occurred.

ERROR:
{error_message}

FILE: {file_path}

CURRENT FILE CONTENT:
```
{current_content}
```

Analyze the error and produce a fix.
OUTPUT FORMAT (JSON only):
{
  \"analysis\": \"What caused the error\",
  \"fix_type\": \"diff\",
  \"changes\": [
    {
      \"search\": \"Code causing the error\",
      \"replace\": \"Fixed code\"
    }
  ]
}";

/// Assembles the size-capped context sections shared by the stages.
///
/// Borrow one per call site; the builder itself is stateless beyond the
/// configured caps.
pub struct ContextBuilder<'config> {
    /// Caps governing every section.
    config: &'config ContextConfig,
}

impl<'config> ContextBuilder<'config> {
    /// Creates a builder over the given caps.
    #[must_use]
    pub fn new(config: &'config ContextConfig) -> Self {
        Self { config }
    }

    /// Bulleted listing of the first `max_tree_paths` project paths.
    ///
    /// Empty when the project has no files, so the prompt carries no
    /// vacant section header.
    #[must_use]
    pub fn file_tree(&self, files: &ProjectFiles) -> String {
        if files.is_empty() {
            return String::new();
        }

        let listing: Vec<String> = files
            .keys()
            .take(self.config.max_tree_paths)
            .map(|path| format!("- {path}"))
            .collect();
        format!("\n\nPROJECT FILE TREE:\n{}", listing.join("\n"))
    }

    /// Summary lines for the last `max_recent_entries` ledger entries.
    #[must_use]
    pub fn recent_changes(&self, entries: &[ContextEntry]) -> String {
        if entries.is_empty() {
            return String::new();
        }

        let start = entries.len().saturating_sub(self.config.max_recent_entries);
        let mut result = String::from("\n\nRECENT CHANGES:\n");
        for entry in entries.iter().skip(start) {
            result.push_str(&format!("- {}: {}\n", entry.file, entry.summary));
        }
        result
    }

    /// Priority-ordered, size-capped selection of current file contents.
    ///
    /// Priority: the entry file, then files touched this session, then
    /// component sources. Dependency manifests, config files, and
    /// anything under `node_modules` never qualify. At most
    /// `max_context_files` files, each truncated to `max_file_chars`
    /// characters.
    #[must_use]
    pub fn relevant_files(
        &self,
        files: &ProjectFiles,
        recent: &HashMap<String, String>,
    ) -> String {
        let mut selected: Vec<(&String, &String)> = Vec::new();

        if let Some(content) = files.get(&self.config.entry_file) {
            selected.push((&self.config.entry_file, content));
        }

        for (path, content) in files {
            if selected.len() >= self.config.max_context_files {
                break;
            }
            if Self::excluded(path) || *path == self.config.entry_file {
                continue;
            }
            if recent.contains_key(path) {
                selected.push((path, content));
            }
        }

        for (path, content) in files {
            if selected.len() >= self.config.max_context_files {
                break;
            }
            if Self::excluded(path)
                || selected.iter().any(|(chosen, _)| *chosen == path)
                || !Self::component_like(path)
            {
                continue;
            }
            selected.push((path, content));
        }

        if selected.is_empty() {
            return String::new();
        }

        let mut result = String::from("\n\nCURRENT FILE CONTENTS:\n");
        for (path, content) in selected.iter().take(self.config.max_context_files) {
            let truncated: String = content.chars().take(self.config.max_file_chars).collect();
            result.push_str(&format!("\n--- {path} ---\n{truncated}\n"));
        }
        result
    }

    /// Execution-prompt rendering of the trailing ledger window.
    #[must_use]
    pub fn summary_window(&self, entries: &[ContextEntry]) -> String {
        if entries.is_empty() {
            return "No previous tasks".to_owned();
        }

        let start = entries
            .len()
            .saturating_sub(self.config.recent_summary_window);
        entries
            .iter()
            .skip(start)
            .map(|entry| format!("- {}: {}", entry.file, entry.summary))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn excluded(path: &str) -> bool {
        path.contains("node_modules") || path.ends_with(".json") || path.ends_with(".config.js")
    }

    fn component_like(path: &str) -> bool {
        path.contains("/components/") && (path.ends_with(".jsx") || path.ends_with(".tsx"))
    }
}

/// Renders a design-guideline list as prompt bullet lines.
///
/// "None" collapses to an empty section rather than an explanatory
/// placeholder; the template header alone is enough signal.
#[must_use]
pub fn render_guidelines(guidelines: Option<&DesignGuidelines>) -> String {
    let Some(guidelines) = guidelines else {
        return String::new();
    };

    let mut lines: Vec<String> = guidelines
        .guidelines
        .iter()
        .map(|guideline| format!("- {guideline}"))
        .collect();
    for import in &guidelines.suggested_imports {
        lines.push(format!("- Import: {import}"));
    }
    if let Some(palette) = &guidelines.color_palette {
        lines.push(format!("- Palette: {palette}"));
    }
    lines.join("\n")
}
