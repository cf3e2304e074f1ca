//! Failure classification for the model service's error channel.
//!
//! The service surfaces failures as opaque message strings, so this is a
//! substring heuristic kept in one place where it can be tested on its
//! own. The generation client acts on the returned class; nothing else
//! inspects error text.

use regex::Regex;
use std::time::Duration;

/// Ordered patterns tried when extracting a retry-after hint from an
/// error message. The first match wins.
const RETRY_DELAY_PATTERNS: [&str; 3] = [
    r"(?i)retry in ([\d.]+)s",
    r"(?i)retry_delay.*?seconds:\s*([\d.]+)",
    r"(?i)Please retry in ([\d.]+)",
];

/// Lowercased markers of failures that retrying cannot help.
const FATAL_MARKERS: [&str; 5] = [
    "api key not valid",
    "api_key_invalid",
    "permission_denied",
    "401",
    "403",
];

/// How a failed generation call should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The key hit its quota; cool it down for the given duration.
    RateLimited(Duration),
    /// Worth retrying after exponential backoff.
    Transient,
    /// Retrying cannot help: bad credential or permission refusal.
    Fatal,
}

/// Classifies an error message from the model service.
///
/// Credential and permission failures are checked first so they never
/// burn the retry budget. Quota responses are recognized by "429",
/// "quota", or "rate" appearing anywhere in the message; the cooldown is
/// taken from the message's own hint when present, otherwise
/// `default_retry_after`. Everything else is transient.
pub fn classify_error(message: &str, default_retry_after: Duration) -> ErrorClass {
    let lowered = message.to_lowercase();

    if FATAL_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return ErrorClass::Fatal;
    }

    if message.contains("429") || lowered.contains("quota") || lowered.contains("rate") {
        let retry_after = parse_retry_delay(message).unwrap_or(default_retry_after);
        return ErrorClass::RateLimited(retry_after);
    }

    ErrorClass::Transient
}

/// Extracts a retry-after duration from an error message.
///
/// Returns `None` when no pattern matches or the captured number cannot
/// be used as a duration.
pub fn parse_retry_delay(message: &str) -> Option<Duration> {
    for pattern in RETRY_DELAY_PATTERNS {
        let Ok(regex) = Regex::new(pattern) else {
            continue;
        };

        if let Some(captures) = regex.captures(message)
            && let Some(capture) = captures.get(1)
            && let Ok(seconds) = capture.as_str().parse::<f64>()
        {
            return Duration::try_from_secs_f64(seconds).ok();
        }
    }

    None
}
