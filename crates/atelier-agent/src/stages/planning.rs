//! Turns a user request into an ordered task plan.

use crate::parser;
use crate::prompts::{ContextBuilder, PLANNING_TEMPLATE};
use atelier_core::{ContextConfig, ContextEntry, Plan, ProjectFiles, Result};
use atelier_providers::GenerationClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Planning stage: request + project snapshot in, [`Plan`] out.
pub struct PlanningStage {
    /// Shared generation client.
    client: Arc<GenerationClient>,
    /// Caps for the assembled context sections.
    context: ContextConfig,
}

impl PlanningStage {
    /// Creates the stage over a shared client.
    pub fn new(client: Arc<GenerationClient>, context: ContextConfig) -> Self {
        Self { client, context }
    }

    /// Produces a plan for `request` against the given project snapshot.
    ///
    /// The prompt carries a bounded file tree, the recent-change ledger
    /// window, and a prioritized selection of file contents so the
    /// planner can ground fix requests in real code instead of asking
    /// the user what they meant.
    ///
    /// # Errors
    /// Propagates generation failures and malformed planner output.
    pub async fn plan(
        &self,
        request: &str,
        files: &ProjectFiles,
        recent_entries: &[ContextEntry],
        recent_files: &HashMap<String, String>,
    ) -> Result<Plan> {
        let builder = ContextBuilder::new(&self.context);
        let prompt = format!(
            "{PLANNING_TEMPLATE}{file_tree}{recent_changes}{file_contents}\n\n\
             USER REQUEST: {request}\n\n\
             When the request is a fix, consult the file contents above before \
             asking for clarification.\n\n\
             Respond with JSON only.",
            file_tree = builder.file_tree(files),
            recent_changes = builder.recent_changes(recent_entries),
            file_contents = builder.relevant_files(files, recent_files),
        );

        let response = self.client.generate(&prompt).await?;
        let plan: Plan = parser::decode(&response)?;
        info!(
            "planned {} task(s), clarification needed: {}",
            plan.tasks.len(),
            plan.needs_clarification
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{Error, RetryConfig, TaskKind};
    use atelier_providers::{KeyPool, MockOracle};

    fn stage_with(oracle: &MockOracle) -> PlanningStage {
        let pool = KeyPool::new(vec!["test-key".to_owned()]).expect("pool");
        let client = Arc::new(GenerationClient::new(
            Arc::new(oracle.clone()),
            Arc::new(pool),
            RetryConfig::default(),
        ));
        PlanningStage::new(client, ContextConfig::default())
    }

    #[tokio::test]
    async fn test_plan_decodes_tasks() {
        let oracle = MockOracle::new();
        oracle.push_text(
            r#"```json
{
  "understanding": "Add a todo list",
  "needs_clarification": false,
  "tasks": [
    {"id": 1, "type": "file", "description": "Create the list", "file": "src/components/TodoList.jsx", "action": "create", "dependencies": []},
    {"id": 2, "type": "file", "description": "Wire it up", "file": "src/App.jsx", "action": "update", "dependencies": [1]}
  ],
  "estimated_complexity": "simple"
}
```"#,
        );
        let stage = stage_with(&oracle);

        let plan = stage
            .plan("add a todo list", &ProjectFiles::new(), &[], &HashMap::new())
            .await
            .expect("should plan");
        assert_eq!(plan.tasks.len(), 2);
        assert_eq!(plan.tasks[0].kind, TaskKind::File);
        assert_eq!(plan.tasks[1].dependencies, vec![1]);
    }

    #[tokio::test]
    async fn test_plan_prompt_carries_project_context() {
        let oracle = MockOracle::new();
        oracle.push_text(r#"{"understanding": "ok", "tasks": []}"#);
        let stage = stage_with(&oracle);

        let mut files = ProjectFiles::new();
        files.insert("src/App.jsx".to_owned(), "function App() {}".to_owned());
        let entries = vec![ContextEntry::new("src/App.jsx", "added the shell")];

        stage
            .plan("polish it", &files, &entries, &HashMap::new())
            .await
            .expect("should plan");

        let history = oracle.get_call_history();
        let prompt = &history[0].prompt;
        assert!(prompt.contains("PROJECT FILE TREE:"));
        assert!(prompt.contains("- src/App.jsx"));
        assert!(prompt.contains("RECENT CHANGES:"));
        assert!(prompt.contains("added the shell"));
        assert!(prompt.contains("USER REQUEST: polish it"));
    }

    #[tokio::test]
    async fn test_plan_malformed_response_is_error() {
        let oracle = MockOracle::new();
        oracle.push_text("I am unable to produce a plan right now.");
        let stage = stage_with(&oracle);

        let result = stage
            .plan("do things", &ProjectFiles::new(), &[], &HashMap::new())
            .await;
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_plan_clarification_passthrough() {
        let oracle = MockOracle::new();
        oracle.push_text(
            r#"{"understanding": "unclear", "needs_clarification": true, "clarification_question": "Which page?", "tasks": []}"#,
        );
        let stage = stage_with(&oracle);

        let plan = stage
            .plan("fix the button", &ProjectFiles::new(), &[], &HashMap::new())
            .await
            .expect("should plan");
        assert!(plan.needs_clarification);
        assert_eq!(plan.clarification_question.as_deref(), Some("Which page?"));
    }
}
