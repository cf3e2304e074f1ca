//! Credential pooling and retrying model access for the atelier backend.
//!
//! This crate provides the infrastructure between the agent stages and the
//! generation service:
//! - `KeyPool` for rotating credentials through per-key cooldowns
//! - failure classification that steers retry, rotate, and abort decisions
//! - `GenerationClient` wrapping any oracle with the retry policy
//! - the Gemini HTTP oracle and a scripted mock for tests
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

/// Failure classification and retry-delay extraction.
pub mod classify;
/// Retrying generation client.
pub mod client;
/// Gemini HTTP oracle.
pub mod gemini;
/// Credential pool with cooldown tracking.
pub mod key_pool;
/// Scripted mock oracle for tests.
pub mod mock;

pub use classify::{ErrorClass, classify_error, parse_retry_delay};
pub use client::GenerationClient;
pub use gemini::GeminiOracle;
pub use key_pool::{KeyLease, KeyPool};
pub use mock::{MockOracle, OracleCall};
