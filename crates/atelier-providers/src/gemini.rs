use async_trait::async_trait;
use atelier_core::{Error, ModelOracle, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Gemini API base URL; the model name and credential complete the path.
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// Default model for Gemini.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Gemini API oracle (free tier with per-key quotas).
///
/// Holds no credential of its own: the key arrives per call from whatever
/// lease the pool handed out, so one oracle serves every key.
pub struct GeminiOracle {
    /// HTTP client for API requests.
    client: Client,
    /// Model name to use.
    model: String,
}

impl GeminiOracle {
    /// Creates a new `GeminiOracle` with the default model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::default(),
            model: DEFAULT_MODEL.to_owned(),
        }
    }

    /// Sets the model to use for generation.
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }
}

impl Default for GeminiOracle {
    fn default() -> Self {
        Self::new()
    }
}

/// Request payload sent to the Gemini generate-content API.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    /// Conversation turns for the request.
    contents: Vec<GeminiContent>,
}

/// One conversation turn delivered to the Gemini API.
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    /// Pieces that make up the turn.
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// A single text piece within a content turn.
#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    /// Text content of the piece.
    #[serde(default)]
    text: String,
}

/// Response payload returned by Gemini.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    /// List of candidate completions.
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

/// A single completion candidate returned by Gemini.
#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    /// Content generated for the candidate.
    #[serde(default)]
    content: Option<GeminiContent>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate's parts.
    ///
    /// Long generations arrive split across several parts; joining them is
    /// required to recover the full output.
    fn candidate_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[async_trait]
impl ModelOracle for GeminiOracle {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn generate(&self, credential: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{GEMINI_API_URL}/{}:generateContent?key={credential}",
            self.model
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_owned(),
                }],
            }],
        };

        debug!("sending {} chars to {}", prompt.len(), self.model);
        let response = self.client.post(&url).json(&request).send().await?;

        // Keep the status digits and body verbatim in the message: the
        // retry layer classifies failures by reading exactly this text.
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(Error::Oracle(format!("{status}: {body}")));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|err| {
            Error::MalformedResponse(format!("failed to decode response body: {err}"))
        })?;

        gemini_response
            .candidate_text()
            .ok_or_else(|| Error::Oracle("empty response".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_defaults() {
        let oracle = GeminiOracle::new();
        assert_eq!(oracle.name(), "Gemini");
        assert_eq!(oracle.model, DEFAULT_MODEL);
    }

    #[test]
    fn oracle_with_model() {
        let oracle = GeminiOracle::new().with_model("gemini-2.5-pro".to_owned());
        assert_eq!(oracle.model, "gemini-2.5-pro");
    }

    #[test]
    fn request_serializes_to_wire_shape() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: "build a todo app".to_owned(),
                }],
            }],
        };

        let value = serde_json::to_value(&request).unwrap_or_default();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "build a todo app");
    }

    #[test]
    fn candidate_text_joins_parts() {
        let payload = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "first half"},
                        {"text": " and second half"}
                    ]
                }
            }]
        }"#;

        let response: GeminiResponse =
            serde_json::from_str(payload).unwrap_or_else(|_| GeminiResponse {
                candidates: Vec::new(),
            });
        assert_eq!(
            response.candidate_text().as_deref(),
            Some("first half and second half")
        );
    }

    #[test]
    fn candidate_text_empty_when_no_candidates() {
        let response: GeminiResponse =
            serde_json::from_str("{}").unwrap_or_else(|_| GeminiResponse {
                candidates: Vec::new(),
            });
        assert!(response.candidate_text().is_none());
    }

    #[test]
    fn candidate_text_empty_when_blocked() {
        // Safety-blocked candidates arrive without a content field
        let payload = r#"{"candidates": [{"finishReason": "SAFETY"}]}"#;
        let response: GeminiResponse =
            serde_json::from_str(payload).unwrap_or_else(|_| GeminiResponse {
                candidates: Vec::new(),
            });
        assert!(response.candidate_text().is_none());
    }
}
