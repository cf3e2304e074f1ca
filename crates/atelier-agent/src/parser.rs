//! Extraction of structured JSON from raw model text.
//!
//! Models wrap their JSON in markdown fences, lead with prose, or trail
//! with commentary. Parsing here never fails outright: anything
//! unusable degrades to a sentinel carrying a bounded preview of the
//! raw text so callers can log what actually came back.

use atelier_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Longest raw-text preview retained when parsing fails.
pub const RAW_PREVIEW_LIMIT: usize = 500;

/// Outcome of parsing one model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    /// A JSON value was recovered from the text.
    Structured(Value),
    /// No JSON could be recovered.
    Malformed {
        /// Bounded preview of the unusable text.
        raw: String,
    },
}

impl ParsedResponse {
    /// Recovered value, if parsing succeeded.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Malformed { .. } => None,
        }
    }

    /// Whether parsing fell through to the sentinel.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

/// Extracts a JSON value from raw model text.
///
/// Tries, in order: stripping a markdown code fence, a direct decode,
/// and a decode of the widest `{`..`}` span. Never panics on any input.
pub fn parse_response(text: &str) -> ParsedResponse {
    let trimmed = text.trim();
    let candidate = strip_fences(trimmed);

    if let Ok(value) = serde_json::from_str(candidate) {
        return ParsedResponse::Structured(value);
    }

    if let (Some(start), Some(end)) = (candidate.find('{'), candidate.rfind('}'))
        && start < end
        && let Some(span) = candidate.get(start..=end)
        && let Ok(value) = serde_json::from_str(span)
    {
        return ParsedResponse::Structured(value);
    }

    ParsedResponse::Malformed {
        raw: preview(candidate),
    }
}

/// Parses model text and decodes it into a stage's typed shape.
///
/// # Errors
/// [`Error::MalformedResponse`] when no JSON could be recovered, or
/// [`Error::Json`] when the recovered value does not fit `T`.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    match parse_response(text) {
        ParsedResponse::Structured(value) => Ok(serde_json::from_value(value)?),
        ParsedResponse::Malformed { raw } => Err(Error::MalformedResponse(raw)),
    }
}

/// Returns the content of the first markdown code fence, or the input
/// unchanged when no fence is present.
fn strip_fences(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let after = text.get(start + 7..).unwrap_or("");
        return match after.find("```") {
            Some(end) => after.get(..end).unwrap_or(after).trim(),
            // Unterminated fence: take everything after the marker
            None => after.trim(),
        };
    }

    if let Some(start) = text.find("```") {
        let after = text.get(start + 3..).unwrap_or("");
        return match after.find("```") {
            Some(end) => after.get(..end).unwrap_or(after).trim(),
            None => after.trim(),
        };
    }

    text
}

/// Truncates to [`RAW_PREVIEW_LIMIT`] characters.
fn preview(text: &str) -> String {
    text.chars().take(RAW_PREVIEW_LIMIT).collect()
}
