//! Core types and traits for the atelier generation backend.
//!
//! This crate provides the shared data model, error handling, configuration,
//! and trait definitions used across the atelier system.
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

/// Configuration loading and defaults.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Synchronization utilities.
pub mod sync;
/// Trait definitions for model oracles.
pub mod traits;
/// Core data types for plans, tasks, changes, and results.
pub mod types;

pub use config::{AtelierConfig, ContextConfig, GenerationConfig, KeyConfig, RetryConfig};
pub use error::{Error, Result};
pub use sync::IgnoreLock;
pub use traits::ModelOracle;
pub use types::{
    Change, Complexity, ContextEntry, ExecutionResult, KeyStatus, Plan, ProjectFiles,
    RateLimitStatus, Task, TaskAction, TaskKind,
};
