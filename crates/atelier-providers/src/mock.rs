//! Mock oracle for testing generation workflows.
//!
//! Supports scripted outcome sequences for retry-path tests and canned
//! pattern responses for end-to-end pipeline tests, without real API
//! calls.

use async_trait::async_trait;
use atelier_core::{Error, IgnoreLock as _, ModelOracle, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One pre-scripted call result.
///
/// [`Error`] is not `Clone`, so failures are stored as the message the
/// oracle error would carry and rebuilt on delivery.
#[derive(Debug, Clone)]
enum ScriptedOutcome {
    /// Call succeeds with this text.
    Text(String),
    /// Call fails with an oracle error carrying this message.
    Failure(String),
}

/// One recorded oracle invocation.
#[derive(Debug, Clone)]
pub struct OracleCall {
    /// Credential the call was made with.
    pub credential: String,
    /// Prompt text sent.
    pub prompt: String,
}

/// Mock oracle returning scripted or pattern-matched responses.
///
/// Outcomes queued with [`Self::push_text`] and [`Self::push_error`] are
/// consumed in order and take precedence over pattern responses. When the
/// script is empty, the prompt is matched against registered patterns
/// (exact first, then substring), falling back to the default response.
#[derive(Clone)]
pub struct MockOracle {
    /// Queued outcomes consumed one per call.
    script: Arc<Mutex<VecDeque<ScriptedOutcome>>>,
    /// Predefined responses keyed by prompt pattern.
    responses: Arc<Mutex<Vec<(String, String)>>>,
    /// Default response if no pattern matches.
    default_response: Arc<Mutex<Option<String>>>,
    /// Call history for verification.
    call_history: Arc<Mutex<Vec<OracleCall>>>,
}

impl MockOracle {
    /// Create an empty mock oracle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: Arc::new(Mutex::new(None)),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful response.
    pub fn push_text(&self, text: impl Into<String>) {
        let mut script = self.script.lock_ignore_poison();
        script.push_back(ScriptedOutcome::Text(text.into()));
    }

    /// Queue a failure with the given error message.
    pub fn push_error(&self, message: impl Into<String>) {
        let mut script = self.script.lock_ignore_poison();
        script.push_back(ScriptedOutcome::Failure(message.into()));
    }

    /// Add a pattern-based response.
    ///
    /// Patterns are tried in registration order when no exact match
    /// exists, so register the most specific pattern first.
    #[must_use]
    pub fn with_response(self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        {
            let mut responses = self.responses.lock_ignore_poison();
            responses.push((pattern.into(), response.into()));
        }
        self
    }

    /// Set a default response for prompts that don't match any pattern.
    #[must_use]
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        {
            let mut default = self.default_response.lock_ignore_poison();
            *default = Some(response.into());
        }
        self
    }

    /// Clear the call history (used for testing).
    pub fn clear_history(&self) {
        let mut history = self.call_history.lock_ignore_poison();
        history.clear();
    }

    /// Get the call history (every credential and prompt pair seen).
    #[must_use]
    pub fn get_call_history(&self) -> Vec<OracleCall> {
        let history = self.call_history.lock_ignore_poison();
        history.clone()
    }

    /// Get the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        let history = self.call_history.lock_ignore_poison();
        history.len()
    }

    /// Pop the next scripted outcome, if any remain.
    fn next_scripted(&self) -> Option<ScriptedOutcome> {
        let mut script = self.script.lock_ignore_poison();
        script.pop_front()
    }

    /// Find a matching pattern response for the given prompt.
    fn find_response(&self, prompt: &str) -> Option<String> {
        let responses = self.responses.lock_ignore_poison();

        // Try exact match first
        for (pattern, response) in &*responses {
            if pattern == prompt {
                let result = response.clone();
                drop(responses);
                return Some(result);
            }
        }

        // Then substring match, in registration order
        for (pattern, response) in &*responses {
            if prompt.contains(pattern.as_str()) {
                let result = response.clone();
                drop(responses);
                return Some(result);
            }
        }

        drop(responses);
        None
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelOracle for MockOracle {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, credential: &str, prompt: &str) -> Result<String> {
        // Record the call
        {
            let mut history = self.call_history.lock_ignore_poison();
            history.push(OracleCall {
                credential: credential.to_owned(),
                prompt: prompt.to_owned(),
            });
        }

        if let Some(outcome) = self.next_scripted() {
            return match outcome {
                ScriptedOutcome::Text(text) => Ok(text),
                ScriptedOutcome::Failure(message) => Err(Error::Oracle(message)),
            };
        }

        let text = self.find_response(prompt).unwrap_or_else(|| {
            let default = self.default_response.lock_ignore_poison();
            default
                .clone()
                .unwrap_or_else(|| format!("Mock response for prompt: {prompt}"))
        });
        Ok(text)
    }
}
