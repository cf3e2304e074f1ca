//! Fuzzy search/replace patch engine.
//!
//! Turns a model's proposed search/replace blocks into a safe mutation of
//! an existing text buffer. Exact matching is tried first; a
//! whitespace-tolerant line-window fallback covers the drift models
//! introduce when quoting code. Pure and stateless, safe for unrestricted
//! concurrent use.
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

/// Diff application rules and the fuzzy fallback.
pub mod diff;

pub use diff::{FUZZY_MATCH_THRESHOLD, PatchOutcome, apply_all, apply_one};
