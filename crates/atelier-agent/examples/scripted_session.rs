//! Walks one conversation through the full pipeline.
//!
//! Uses the scripted mock oracle, so it needs no network access and no
//! credentials. Run with `cargo run --example scripted_session`; stage
//! flow is logged to stderr.

use atelier_agent::Orchestrator;
use atelier_core::{ContextConfig, ProjectFiles, Result, RetryConfig};
use atelier_providers::{GenerationClient, KeyPool, MockOracle};
use std::io::stderr;
use std::sync::Arc;
use tracing::info;
use tracing::subscriber::set_global_default;
use tracing_subscriber::fmt;

#[tokio::main]
async fn main() -> Result<()> {
    drop(set_global_default(fmt().with_writer(stderr).finish()));

    let oracle = MockOracle::new();
    oracle.push_text(
        r#"{
            "understanding": "Add a greeting banner to the app",
            "needs_clarification": false,
            "tasks": [
                {"id": 1, "type": "file", "description": "Create the banner component", "file": "src/components/Banner.jsx", "action": "create", "dependencies": []},
                {"id": 2, "type": "file", "description": "Mount the banner in App", "file": "src/App.jsx", "action": "update", "dependencies": [1]}
            ],
            "estimated_complexity": "simple"
        }"#,
    );
    oracle.push_text(
        r#"{"design_guidelines": ["Center the text", "Use a warm accent color"], "suggested_imports": [], "color_palette_suggestions": "amber-500 on stone-50"}"#,
    );
    oracle.push_text(
        r#"{
            "thinking": "A centered banner with the greeting",
            "file_content": "export default function Banner() { return <div className=\"banner\">Welcome!</div>; }",
            "summary": "Added Banner component"
        }"#,
    );
    oracle.push_text(
        r#"{
            "thinking": "Mount the banner above the existing content",
            "changes": [{"search": "<main>", "replace": "<Banner />\n      <main>"}],
            "summary": "Mounted Banner in App"
        }"#,
    );

    let pool = KeyPool::new(vec!["demo-key-one".to_owned(), "demo-key-two".to_owned()])?;
    let client = Arc::new(GenerationClient::new(
        Arc::new(oracle),
        Arc::new(pool),
        RetryConfig::default(),
    ));
    let mut orchestrator = Orchestrator::new(client, ContextConfig::default());

    let mut files = ProjectFiles::new();
    files.insert(
        "src/App.jsx".to_owned(),
        "export default function App() {\n  return (\n    <div>\n      <main>content</main>\n    </div>\n  );\n}\n"
            .to_owned(),
    );

    let plan = orchestrator.plan("add a greeting banner", &files).await?;
    info!(
        tasks = plan.tasks.len(),
        complexity = ?plan.estimated_complexity,
        "plan ready"
    );

    for task in &plan.tasks {
        let current = task
            .file
            .as_ref()
            .and_then(|path| files.get(path))
            .cloned()
            .unwrap_or_default();
        let result = orchestrator.execute_task(task, &current).await;
        info!(
            task = task.id,
            success = result.success,
            action = result.action.as_deref().unwrap_or("none"),
            applied = result.changes_applied,
            "task finished"
        );
        if let (Some(path), Some(content)) = (&result.file, &result.content) {
            files.insert(path.clone(), content.clone());
        }
    }

    for entry in orchestrator.context_ledger() {
        info!(file = %entry.file, summary = %entry.summary, "ledger entry");
    }

    let status = orchestrator.rate_limit_status();
    info!(
        keys = status.total_keys,
        current = status.current_key_index,
        "pool status"
    );

    Ok(())
}
