//! Session-level coordination of planning and execution.

use crate::prompts::ContextBuilder;
use crate::stages::{
    CreateStage, DesignGuidelines, DesignStage, EditStage, ErrorRecoveryStage, PlanningStage,
};
use atelier_core::{
    ContextConfig, ContextEntry, Error, ExecutionResult, Plan, ProjectFiles, RateLimitStatus,
    Result, Task, TaskAction, TaskKind,
};
use atelier_providers::GenerationClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Drives one conversation through the pipeline: plan, execute tasks,
/// recover from build errors, re-plan on clarification.
///
/// Owns the session state: the context ledger, the latest content of
/// every touched file, and the current plan. One instance per
/// conversation; independent conversations share only the generation
/// client (and through it the process-wide key pool).
pub struct Orchestrator {
    /// Planning stage.
    planning: PlanningStage,
    /// Design stage, consulted for UI component tasks.
    design: DesignStage,
    /// Create stage.
    create: CreateStage,
    /// Edit stage.
    edit: EditStage,
    /// Error-recovery stage.
    error_fix: ErrorRecoveryStage,
    /// Shared generation client, kept for status queries.
    client: Arc<GenerationClient>,
    /// Caps for prompt context sections.
    config: ContextConfig,
    /// Ordered ledger of completed-task summaries.
    context: Vec<ContextEntry>,
    /// Latest known content per touched file.
    recent_files: HashMap<String, String>,
    /// The plan currently being executed.
    current_plan: Option<Plan>,
    /// Project snapshot from the last plan call, reused on clarify.
    planned_files: ProjectFiles,
}

impl Orchestrator {
    /// Creates a fresh session over a shared generation client.
    #[must_use]
    pub fn new(client: Arc<GenerationClient>, config: ContextConfig) -> Self {
        Self {
            planning: PlanningStage::new(Arc::clone(&client), config.clone()),
            design: DesignStage::new(Arc::clone(&client)),
            create: CreateStage::new(Arc::clone(&client)),
            edit: EditStage::new(Arc::clone(&client)),
            error_fix: ErrorRecoveryStage::new(Arc::clone(&client)),
            client,
            config,
            context: Vec::new(),
            recent_files: HashMap::new(),
            current_plan: None,
            planned_files: ProjectFiles::new(),
        }
    }

    /// Plans the given request against a project snapshot.
    ///
    /// The snapshot is retained so a later [`Self::clarify`] can re-plan
    /// with the same file context. The stored plan is replaced wholesale.
    ///
    /// # Errors
    /// Propagates planning-stage failures; session state keeps the
    /// previous plan in that case.
    pub async fn plan(&mut self, request: &str, files: &ProjectFiles) -> Result<Plan> {
        let plan = self
            .planning
            .plan(request, files, &self.context, &self.recent_files)
            .await?;
        self.planned_files = files.clone();
        self.current_plan = Some(plan.clone());
        Ok(plan)
    }

    /// Executes one planned task against the caller-supplied current
    /// content, returning a structured result in every case.
    ///
    /// Create-action tasks (and any task whose target has no content
    /// yet) route to the create stage; everything else routes to the
    /// edit stage. UI component tasks get a design pass first. On
    /// success the ledger and recent-file map absorb the outcome; on
    /// failure session state is left untouched.
    pub async fn execute_task(&mut self, task: &Task, current_content: &str) -> ExecutionResult {
        if task.kind == TaskKind::Command {
            return ExecutionResult::failure(
                task.file.clone(),
                "command tasks run in the client sandbox, not the generation backend",
            );
        }

        let guidelines = self.design_pass(task).await;
        let summary_window = ContextBuilder::new(&self.config).summary_window(&self.context);
        let file = task.file.clone().unwrap_or_default();

        let result = if task.action == TaskAction::Create || current_content.is_empty() {
            match self
                .create
                .create(task, &summary_window, guidelines.as_ref())
                .await
            {
                Ok(output) => ExecutionResult {
                    success: true,
                    file: Some(file),
                    action: Some("create".to_owned()),
                    content: Some(output.content),
                    thinking: Some(output.thinking),
                    summary: Some(output.summary),
                    changes_applied: 0,
                    changes_failed: 0,
                    error: None,
                },
                Err(error) => ExecutionResult::failure(task.file.clone(), error.to_string()),
            }
        } else {
            match self
                .edit
                .edit(task, current_content, &summary_window, guidelines.as_ref())
                .await
            {
                Ok(output) => ExecutionResult {
                    success: true,
                    file: Some(file),
                    action: Some("update".to_owned()),
                    content: Some(output.content),
                    thinking: Some(output.thinking),
                    summary: Some(output.summary),
                    changes_applied: output.applied,
                    changes_failed: output.failed,
                    error: None,
                },
                Err(error) => ExecutionResult::failure(task.file.clone(), error.to_string()),
            }
        };

        self.absorb(&result);
        result
    }

    /// Asks the error-recovery stage for a fix and applies it.
    ///
    /// A successful fix updates the recent-file map the same way an
    /// edit would, so the next edit on this path starts from the fixed
    /// content.
    pub async fn handle_error(
        &mut self,
        error_message: &str,
        file: &str,
        current_content: &str,
    ) -> ExecutionResult {
        let result = match self
            .error_fix
            .analyze(error_message, file, current_content)
            .await
        {
            Ok(fix) => ExecutionResult {
                success: true,
                file: Some(file.to_owned()),
                action: Some("fix".to_owned()),
                content: Some(fix.content),
                thinking: Some(fix.analysis),
                summary: None,
                changes_applied: fix.applied,
                changes_failed: fix.failed,
                error: None,
            },
            Err(error) => {
                warn!("error recovery failed for {file}: {error}");
                ExecutionResult::failure(Some(file.to_owned()), error.to_string())
            }
        };

        self.absorb(&result);
        result
    }

    /// Re-plans with the user's answer to the pending clarification
    /// question, reusing the project snapshot from the original plan
    /// call. The new plan replaces the old one; task lists are never
    /// merged.
    ///
    /// # Errors
    /// [`Error::NoActivePlan`] when nothing was planned yet; otherwise
    /// propagates planning failures.
    pub async fn clarify(&mut self, user_response: &str) -> Result<Plan> {
        let Some(plan) = &self.current_plan else {
            return Err(Error::NoActivePlan);
        };

        let request = format!(
            "{}\n\nUser clarification: {user_response}",
            plan.understanding
        );
        let files = self.planned_files.clone();
        self.plan(&request, &files).await
    }

    /// Clears the ledger, the recent-file map, and the current plan.
    pub fn reset(&mut self) {
        self.context.clear();
        self.recent_files.clear();
        self.current_plan = None;
        self.planned_files.clear();
        info!("session state reset");
    }

    /// Current key-pool cooldown snapshot.
    #[must_use]
    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.client.rate_limit_status()
    }

    /// The plan currently being executed, if any.
    #[must_use]
    pub fn current_plan(&self) -> Option<&Plan> {
        self.current_plan.as_ref()
    }

    /// Ordered ledger of completed-task summaries.
    #[must_use]
    pub fn context_ledger(&self) -> &[ContextEntry] {
        &self.context
    }

    /// Latest known content per touched file.
    #[must_use]
    pub fn recent_files(&self) -> &HashMap<String, String> {
        &self.recent_files
    }

    /// Runs the design stage for UI component tasks; any failure
    /// degrades to executing without guidelines.
    async fn design_pass(&self, task: &Task) -> Option<DesignGuidelines> {
        if !task.targets_ui_component() {
            return None;
        }

        match self.design.guidelines(task).await {
            Ok(guidelines) => Some(guidelines),
            Err(error) => {
                warn!("design stage failed, continuing without guidelines: {error}");
                None
            }
        }
    }

    /// Folds a successful result into session state. Failures change
    /// nothing.
    fn absorb(&mut self, result: &ExecutionResult) {
        if !result.success {
            return;
        }
        let Some(file) = &result.file else {
            return;
        };

        if let Some(summary) = &result.summary
            && !summary.is_empty()
        {
            self.context.push(ContextEntry::new(file.clone(), summary.clone()));
        }
        if let Some(content) = &result.content {
            self.recent_files.insert(file.clone(), content.clone());
        }
    }
}
