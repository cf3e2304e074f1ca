use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Project file map handed in by the caller: relative path to full content.
///
/// Ordered so tree listings and prompt assembly stay deterministic.
pub type ProjectFiles = BTreeMap<String, String>;

/// Whether a task targets a project file or a client-side command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// The task writes or edits a project file.
    #[default]
    File,
    /// The task asks the client to run a shell command.
    Command,
}

/// How a file task changes its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskAction {
    /// Write a file that does not exist yet.
    Create,
    /// Modify an existing file.
    #[default]
    Update,
    /// Remove an existing file.
    Delete,
}

/// The planner's difficulty estimate for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// One or two small tasks.
    Simple,
    /// A handful of related tasks.
    #[default]
    Medium,
    /// Many tasks or cross-cutting changes.
    Complex,
}

/// One unit of work produced by the planning stage.
///
/// Tasks are immutable once planned; execution reads them but never
/// rewrites them. Field names and string values match the JSON the
/// planner model emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Planner-assigned identifier, unique within one plan.
    #[serde(default)]
    pub id: u32,
    /// Whether this task targets a file or a command.
    #[serde(rename = "type", default)]
    pub kind: TaskKind,
    /// Human-readable description of the work.
    #[serde(default)]
    pub description: String,
    /// Target file path, present for file tasks.
    #[serde(default)]
    pub file: Option<String>,
    /// How the target file should be changed.
    #[serde(default)]
    pub action: TaskAction,
    /// Shell command for command tasks.
    #[serde(default)]
    pub command: Option<String>,
    /// Ids of tasks this one depends on. Carried from the planner but
    /// not enforced during execution; callers own the ordering.
    #[serde(default)]
    pub dependencies: Vec<u32>,
}

impl Task {
    /// Creates a file task.
    pub fn file_task<D: Into<String>, F: Into<String>>(
        id: u32,
        description: D,
        file: F,
        action: TaskAction,
    ) -> Self {
        Self {
            id,
            kind: TaskKind::File,
            description: description.into(),
            file: Some(file.into()),
            action,
            command: None,
            dependencies: Vec::new(),
        }
    }

    /// Creates a command task.
    pub fn command_task<D: Into<String>, C: Into<String>>(
        id: u32,
        description: D,
        command: C,
    ) -> Self {
        Self {
            id,
            kind: TaskKind::Command,
            description: description.into(),
            file: None,
            action: TaskAction::Update,
            command: Some(command.into()),
            dependencies: Vec::new(),
        }
    }

    /// True when the task targets a React component source file.
    #[must_use]
    pub fn targets_ui_component(&self) -> bool {
        self.file
            .as_deref()
            .is_some_and(|path| path.ends_with(".jsx") || path.ends_with(".tsx"))
    }
}

/// The planner's decomposition of a user request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    /// The planner's restatement of what the user wants.
    #[serde(default)]
    pub understanding: String,
    /// True when the planner needs more information before work starts.
    #[serde(default)]
    pub needs_clarification: bool,
    /// Question to put to the user when clarification is needed.
    #[serde(default)]
    pub clarification_question: Option<String>,
    /// Tasks in the order the planner wants them executed.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// The planner's difficulty estimate.
    #[serde(default)]
    pub estimated_complexity: Complexity,
}

/// Ledger record of one completed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// File the task touched.
    pub file: String,
    /// Model-authored summary of what changed.
    pub summary: String,
}

impl ContextEntry {
    /// Creates a ledger entry.
    pub fn new<F: Into<String>, S: Into<String>>(file: F, summary: S) -> Self {
        Self {
            file: file.into(),
            summary: summary.into(),
        }
    }
}

/// One search/replace instruction from an edit or fix response.
///
/// Ephemeral: consumed by the patch engine and reported only as counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Text to locate in the current file content.
    #[serde(default)]
    pub search: String,
    /// Text that replaces the matched region.
    #[serde(default)]
    pub replace: String,
}

impl Change {
    /// Creates a change instruction.
    pub fn new<S: Into<String>, R: Into<String>>(search: S, replace: R) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
        }
    }
}

/// Outcome of executing one task, handed back to the caller verbatim.
///
/// Execution never panics and never surfaces a bare error; failures are
/// carried in this shape with `success` set to false and session state
/// left untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the stage completed.
    pub success: bool,
    /// File the task targeted, when known.
    #[serde(default)]
    pub file: Option<String>,
    /// Action performed: "create", "update" or "fix".
    #[serde(default)]
    pub action: Option<String>,
    /// Full post-execution file content on success.
    #[serde(default)]
    pub content: Option<String>,
    /// Model reasoning text, when the response carried one.
    #[serde(default)]
    pub thinking: Option<String>,
    /// One-line summary of the change, when the response carried one.
    #[serde(default)]
    pub summary: Option<String>,
    /// Changes that applied cleanly.
    #[serde(default)]
    pub changes_applied: usize,
    /// Changes that found no match in the target content.
    #[serde(default)]
    pub changes_failed: usize,
    /// Failure detail when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Builds a failed result carrying only the error message.
    pub fn failure<T: Into<String>>(file: Option<String>, error: T) -> Self {
        Self {
            success: false,
            file,
            action: None,
            content: None,
            thinking: None,
            summary: None,
            changes_applied: 0,
            changes_failed: 0,
            error: Some(error.into()),
        }
    }
}

/// Snapshot of one credential slot in the key pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyStatus {
    /// Position of the key in the pool.
    pub index: usize,
    /// Whether the key is currently cooling down.
    pub is_rate_limited: bool,
    /// Seconds until the cooldown lapses, when rate limited.
    #[serde(default)]
    pub reset_in_seconds: Option<u64>,
}

/// Pool-wide rate limit snapshot for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitStatus {
    /// Number of credential slots in the pool.
    pub total_keys: usize,
    /// Round-robin cursor position.
    pub current_key_index: usize,
    /// Per-key state in pool order.
    pub keys: Vec<KeyStatus>,
}
