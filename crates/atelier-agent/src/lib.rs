//! Agent pipeline for LLM-driven UI code generation.
//!
//! A user request flows through the stages in order: planning breaks it
//! into file tasks, an optional design pass produces styling guidelines
//! for UI components, then create or edit stages generate content. The
//! [`Orchestrator`] owns one conversation's state and routes tasks to
//! the right stage; build errors reported by the caller go through the
//! error-recovery stage.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        reason = "Allow for tests"
    )
)]

/// Session state and task routing.
pub mod orchestrator;
/// Model response parsing.
pub mod parser;
/// Prompt templates and context assembly.
pub mod prompts;
/// Pipeline stages.
pub mod stages;

pub use orchestrator::Orchestrator;
pub use parser::{ParsedResponse, parse_response};
pub use prompts::ContextBuilder;
pub use stages::{
    CreateOutput, CreateStage, DesignGuidelines, DesignStage, EditOutput, EditStage,
    ErrorRecoveryStage, FixOutput, PlanningStage,
};
