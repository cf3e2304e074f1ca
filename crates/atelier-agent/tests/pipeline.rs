//! Integration tests for the full agent pipeline.
//!
//! Drives a scripted oracle through plan, design, create, edit, and
//! error-recovery flows and checks the session state the orchestrator
//! accumulates along the way.

#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::tests_outside_test_module,
        reason = "Test allows"
    )
)]

use atelier_agent::Orchestrator;
use atelier_core::{ContextConfig, ProjectFiles, RetryConfig};
use atelier_providers::{GenerationClient, KeyPool, MockOracle};
use std::sync::Arc;

const PLAN_RESPONSE: &str = r#"{
    "understanding": "Add a header component and mount it in the app shell",
    "needs_clarification": false,
    "tasks": [
        {"id": 1, "type": "file", "description": "Create the header component", "file": "src/components/Header.jsx", "action": "create", "dependencies": []},
        {"id": 2, "type": "file", "description": "Mount the header in App", "file": "src/App.jsx", "action": "update", "dependencies": [1]}
    ],
    "estimated_complexity": "simple"
}"#;

const DESIGN_RESPONSE: &str = r#"{
    "design_guidelines": ["Use a slate palette", "Keep the header sticky"],
    "suggested_imports": [],
    "color_palette_suggestions": "slate-800 on slate-100"
}"#;

const CREATE_RESPONSE: &str = r#"{
    "thinking": "A plain sticky header with the app title",
    "file_content": "export default function Header() { return <header>My App</header>; }",
    "summary": "Added Header component"
}"#;

const EDIT_RESPONSE: &str = r#"{
    "thinking": "Mount the new component inside the root div",
    "changes": [{"search": "<div />", "replace": "<div><Header /></div>"}],
    "summary": "Mounted Header in App"
}"#;

const APP_CONTENT: &str = "export default function App() { return <div />; }";

fn session(oracle: &MockOracle, keys: Vec<String>) -> Orchestrator {
    let pool = KeyPool::new(keys).expect("pool");
    let client = Arc::new(GenerationClient::new(
        Arc::new(oracle.clone()),
        Arc::new(pool),
        RetryConfig::default(),
    ));
    Orchestrator::new(client, ContextConfig::default())
}

fn project() -> ProjectFiles {
    let mut files = ProjectFiles::new();
    files.insert("src/App.jsx".to_owned(), APP_CONTENT.to_owned());
    files
}

#[tokio::test]
async fn test_full_conversation_create_then_edit() {
    let oracle = MockOracle::new();
    oracle.push_text(PLAN_RESPONSE);
    oracle.push_text(DESIGN_RESPONSE);
    oracle.push_text(CREATE_RESPONSE);
    oracle.push_text(EDIT_RESPONSE);
    let mut orchestrator = session(&oracle, vec!["key-one".to_owned()]);

    let plan = orchestrator
        .plan("add a header", &project())
        .await
        .expect("plan");
    assert_eq!(plan.tasks.len(), 2);

    let created = orchestrator.execute_task(&plan.tasks[0], "").await;
    assert!(created.success, "create failed: {:?}", created.error);
    assert_eq!(created.action.as_deref(), Some("create"));

    let edited = orchestrator.execute_task(&plan.tasks[1], APP_CONTENT).await;
    assert!(edited.success, "edit failed: {:?}", edited.error);
    assert_eq!(edited.changes_applied, 1);
    assert_eq!(edited.changes_failed, 0);
    assert!(
        edited
            .content
            .as_deref()
            .is_some_and(|content| content.contains("<Header />"))
    );

    // Both successes landed in the ledger, in execution order
    let ledger = orchestrator.context_ledger();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].file, "src/components/Header.jsx");
    assert_eq!(ledger[1].summary, "Mounted Header in App");

    // Session retains the latest content of every touched file
    let recent = orchestrator.recent_files();
    assert!(
        recent
            .get("src/components/Header.jsx")
            .is_some_and(|content| content.contains("function Header"))
    );
    assert!(
        recent
            .get("src/App.jsx")
            .is_some_and(|content| content.contains("<Header />"))
    );

    let history = oracle.get_call_history();
    assert_eq!(history.len(), 4, "plan, design, create, edit");
    // The UI component task got a design pass before generation
    assert!(history[1].prompt.contains("expert UI designer"));
    // Design guidelines flowed into the create prompt
    assert!(history[2].prompt.contains("Use a slate palette"));
    // The edit prompt saw the earlier create through the rolling window
    assert!(history[3].prompt.contains("Added Header component"));
    assert!(history[3].prompt.contains(APP_CONTENT));
}

#[tokio::test]
async fn test_rate_limited_key_rotates_mid_conversation() {
    let oracle = MockOracle::new();
    oracle.push_error("429 Too Many Requests: RESOURCE_EXHAUSTED");
    oracle.push_text(r#"{"understanding": "trivial tweak", "tasks": []}"#);
    let mut orchestrator = session(
        &oracle,
        vec!["key-one".to_owned(), "key-two".to_owned()],
    );

    let plan = orchestrator
        .plan("tweak a label", &ProjectFiles::new())
        .await
        .expect("plan survives the limited key");
    assert!(plan.tasks.is_empty());

    // The quota failure rotated to the second key without giving up
    let history = oracle.get_call_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].credential, "key-one");
    assert_eq!(history[1].credential, "key-two");

    let status = orchestrator.rate_limit_status();
    assert!(status.keys[0].is_rate_limited);
    assert!(!status.keys[1].is_rate_limited);
}

#[tokio::test]
async fn test_build_error_recovery_updates_session() {
    let oracle = MockOracle::new();
    oracle.push_text(
        r#"{
            "analysis": "Header is referenced but never imported",
            "fix_type": "diff",
            "changes": [{"search": "export default function App", "replace": "import Header from './components/Header';\n\nexport default function App"}]
        }"#,
    );
    let mut orchestrator = session(&oracle, vec!["key-one".to_owned()]);

    let broken = "export default function App() { return <div><Header /></div>; }";
    let result = orchestrator
        .handle_error("ReferenceError: Header is not defined", "src/App.jsx", broken)
        .await;

    assert!(result.success, "fix failed: {:?}", result.error);
    assert_eq!(result.action.as_deref(), Some("fix"));
    assert_eq!(result.changes_applied, 1);

    // The fixed content becomes the session's view of the file
    let recent = orchestrator.recent_files();
    assert!(
        recent
            .get("src/App.jsx")
            .is_some_and(|content| content.starts_with("import Header"))
    );

    let history = oracle.get_call_history();
    assert!(history[0].prompt.contains("ReferenceError"));
    assert!(history[0].prompt.contains(broken));
}

#[tokio::test]
async fn test_clarification_replan_then_execute() {
    let oracle = MockOracle::new();
    oracle.push_text(
        r#"{"understanding": "Change a color somewhere", "needs_clarification": true, "clarification_question": "Which element?", "tasks": []}"#,
    );
    oracle.push_text(
        r#"{
            "understanding": "Darken the app background",
            "needs_clarification": false,
            "tasks": [
                {"id": 1, "type": "file", "description": "Darken the background", "file": "src/App.jsx", "action": "update", "dependencies": []}
            ]
        }"#,
    );
    oracle.push_text(
        r#"{
            "thinking": "swap the class",
            "changes": [{"search": "<div />", "replace": "<div className=\"bg-slate-900\" />"}],
            "summary": "Darkened the background"
        }"#,
    );
    let mut orchestrator = session(&oracle, vec!["key-one".to_owned()]);

    let first = orchestrator
        .plan("make it darker", &project())
        .await
        .expect("first plan");
    assert!(first.needs_clarification);
    assert_eq!(first.clarification_question.as_deref(), Some("Which element?"));

    let second = orchestrator
        .clarify("the whole app background")
        .await
        .expect("clarified plan");
    assert_eq!(second.tasks.len(), 1);

    let result = orchestrator.execute_task(&second.tasks[0], APP_CONTENT).await;
    assert!(result.success, "edit failed: {:?}", result.error);
    assert!(
        result
            .content
            .as_deref()
            .is_some_and(|content| content.contains("bg-slate-900"))
    );

    // The re-plan carried the original understanding, the user's answer,
    // and the retained project snapshot
    let history = oracle.get_call_history();
    let replan_prompt = &history[1].prompt;
    assert!(replan_prompt.contains("Change a color somewhere"));
    assert!(replan_prompt.contains("User clarification: the whole app background"));
    assert!(replan_prompt.contains("- src/App.jsx"));
}
