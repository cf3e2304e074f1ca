//! Configuration for credentials, retry behavior, and context assembly.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the primary API key.
pub const PRIMARY_KEY_ENV: &str = "GEMINI_API_KEY";
/// Highest numbered fallback key environment variable (`GEMINI_API_KEY_2`..`_9`).
pub const MAX_KEY_ENV_INDEX: u32 = 9;

/// Complete backend configuration.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AtelierConfig {
    /// API credentials for the generation service
    pub keys: KeyConfig,
    /// Retry and backoff behavior
    pub retry: RetryConfig,
    /// Model selection
    pub generation: GenerationConfig,
    /// Prompt context assembly limits
    pub context: ContextConfig,
}

/// API credentials for the generation service.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Keys listed in the config file, tried before environment keys.
    pub api_keys: Vec<String>,
}

impl KeyConfig {
    /// Collects all configured credentials: config file keys first, then
    /// `GEMINI_API_KEY` and the numbered fallbacks `GEMINI_API_KEY_2`
    /// through `GEMINI_API_KEY_9`.
    ///
    /// An empty result is not an error here; the key pool treats an empty
    /// credential list as fatal at construction.
    pub fn resolve(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .api_keys
            .iter()
            .filter(|key| !key.is_empty())
            .cloned()
            .collect();

        if let Ok(key) = env::var(PRIMARY_KEY_ENV)
            && !key.is_empty()
        {
            keys.push(key);
        }
        for index in 2..=MAX_KEY_ENV_INDEX {
            if let Ok(key) = env::var(format!("{PRIMARY_KEY_ENV}_{index}"))
                && !key.is_empty()
            {
                keys.push(key);
            }
        }

        keys
    }
}

/// Retry and backoff behavior for generation calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts for transient failures before giving up
    pub max_attempts: u32,
    /// Base delay in milliseconds for exponential backoff
    pub base_delay_ms: u64,
    /// Cap in milliseconds on any single backoff delay
    pub max_delay_ms: u64,
    /// Cooldown in seconds when a rate limit response carries no delay hint
    pub default_retry_after_secs: u64,
    /// Floor in milliseconds on the wait when every key is cooling down
    pub min_limit_wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 60_000,
            default_retry_after_secs: 60,
            min_limit_wait_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Base delay for exponential backoff.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Cap on any single backoff delay.
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Cooldown applied when a rate limit response carries no delay hint.
    #[must_use]
    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }

    /// Floor on the wait when every key is cooling down.
    #[must_use]
    pub fn min_limit_wait(&self) -> Duration {
        Duration::from_millis(self.min_limit_wait_ms)
    }

    /// Exponential backoff delay for the given zero-based attempt,
    /// capped at [`RetryConfig::max_delay`].
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(31);
        let raw = self.base_delay_ms.saturating_mul(1_u64 << exponent);
        Duration::from_millis(raw.min(self.max_delay_ms))
    }
}

/// Model selection for the generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Model identifier requested from the service
    pub model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_owned(),
        }
    }
}

/// Limits that shape how much project state goes into each prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// File given priority when selecting relevant sources
    pub entry_file: String,
    /// Maximum paths listed in the project tree section
    pub max_tree_paths: usize,
    /// Maximum ledger entries listed in the planning prompt
    pub max_recent_entries: usize,
    /// Maximum full files included in the planning prompt
    pub max_context_files: usize,
    /// Per-file character cap for included file content
    pub max_file_chars: usize,
    /// Ledger entries rendered into execution prompts
    pub recent_summary_window: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            entry_file: "src/App.jsx".to_owned(),
            max_tree_paths: 20,
            max_recent_entries: 10,
            max_context_files: 5,
            max_file_chars: 2000,
            recent_summary_window: 5,
        }
    }
}

impl AtelierConfig {
    /// Get the default config directory path (`~/.atelier`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_owned()))?;
        Ok(home.join(".atelier"))
    }

    /// Get the default config file path (`~/.atelier/config.toml`)
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from the default location (`~/.atelier/config.toml`)
    /// If the config doesn't exist, creates it with default values
    ///
    /// # Errors
    /// Returns an error if the config cannot be read or created
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            let config = Self::default();
            config.save_to_file(&config_path)?;
            Ok(config)
        }
    }

    /// Load config from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|error| Error::Config(format!("Failed to read config: {error}")))?;
        let config: Self = toml::from_str(&contents)?;

        tracing::debug!(
            "Loaded config from {:?}: {} file keys, model {}",
            path,
            config.keys.api_keys.len(),
            config.generation.model
        );

        Ok(config)
    }

    /// Save config to a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                Error::Config(format!("Failed to create config directory: {error}"))
            })?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|error| Error::Config(format!("Failed to serialize config: {error}")))?;

        let header = "# Atelier Configuration File\n\
                      # This file is automatically generated on first run\n\
                      # Edit this file to customize your settings\n\n";

        fs::write(path, format!("{header}{contents}"))
            .map_err(|error| Error::Config(format!("Failed to write config: {error}")))?;

        Ok(())
    }

    /// Collects credentials from the config file and environment.
    pub fn resolve_api_keys(&self) -> Vec<String> {
        self.keys.resolve()
    }
}
