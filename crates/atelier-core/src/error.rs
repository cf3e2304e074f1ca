use core::result::Result as CoreResult;
use std::io::Error as IoError;

use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use toml::de::Error as TomlError;

/// Result type for backend operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur across the generation backend.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// An HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model service reported a transport or status failure.
    ///
    /// The message carries whatever status and body text the service
    /// returned; rate limit classification reads it verbatim.
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Required API key was not found.
    #[error("API key not found: {0}")]
    MissingApiKey(String),

    /// The model returned text that could not be decoded into the
    /// expected shape. Carries a bounded preview of the raw text.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// An edit or fix response carried no usable changes.
    #[error("No changes provided")]
    EmptyChangeSet,

    /// A clarification was submitted before any plan existed.
    #[error("No active plan to clarify")]
    NoActivePlan,

    /// The retry budget ran out before a generation succeeded.
    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made before giving up.
        attempts: u32,
        /// Message of the final failure.
        last_error: String,
    },

    /// A general error not covered by other variants.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Determines whether this error may succeed if retried.
    ///
    /// Returns `true` for transient errors like network failures or oracle errors.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Oracle(_))
    }
}
