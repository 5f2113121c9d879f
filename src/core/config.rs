//! Configuration management

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Public endpoint used by the Google translate web widget
pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Folder names that hold translatable XML inside a mod
const DEFAULT_ALLOWED_FOLDERS: &[&str] = &["DefInjected", "Keyed"];

/// Path fragments that are never translated (race defs and grammar rule packs)
const DEFAULT_EXCLUDED_FRAGMENTS: &[&str] = &["AlienRace.ThingDef_AlienRace", "RulePackDef"];

/// Configuration for translator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Translation endpoint URL
    pub api_endpoint: String,
    /// Files translated concurrently
    pub max_workers: usize,
    /// Service calls per unit, first call included
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub retry_delay_ms: u64,
    /// HTTP request timeout
    pub timeout_ms: u64,
    /// Folder names a file must sit under
    pub allowed_folders: Vec<String>,
    /// Relative-path fragments that exclude a file
    pub excluded_fragments: Vec<String>,
    /// File extension to pick up, without the dot
    pub extension: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
            max_workers: 10,
            max_attempts: 3,
            retry_delay_ms: 2000,
            timeout_ms: 30000,
            allowed_folders: DEFAULT_ALLOWED_FOLDERS.iter().map(|s| s.to_string()).collect(),
            excluded_fragments: DEFAULT_EXCLUDED_FRAGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extension: "xml".to_string(),
        }
    }
}

impl TranslatorConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let api_endpoint =
            std::env::var("TRANSLATE_ENDPOINT").unwrap_or(defaults.api_endpoint);

        let max_workers = std::env::var("MAX_WORKERS")
            .unwrap_or_else(|_| defaults.max_workers.to_string())
            .parse::<usize>()?;

        let max_attempts = std::env::var("MAX_ATTEMPTS")
            .unwrap_or_else(|_| defaults.max_attempts.to_string())
            .parse::<u32>()?;

        let retry_delay_ms = std::env::var("RETRY_DELAY_MS")
            .unwrap_or_else(|_| defaults.retry_delay_ms.to_string())
            .parse::<u64>()?;

        let timeout_ms = std::env::var("REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| defaults.timeout_ms.to_string())
            .parse::<u64>()?;

        Ok(Self {
            api_endpoint,
            max_workers,
            max_attempts,
            retry_delay_ms,
            timeout_ms,
            ..defaults
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_endpoint.is_empty() {
            return Err(anyhow::anyhow!("API endpoint is required"));
        }

        if self.max_workers == 0 {
            return Err(anyhow::anyhow!("max_workers must be greater than 0"));
        }

        if self.max_attempts == 0 {
            return Err(anyhow::anyhow!("max_attempts must be greater than 0"));
        }

        if self.allowed_folders.is_empty() {
            return Err(anyhow::anyhow!("at least one allowed folder is required"));
        }

        if self.retry_delay_ms == 0 {
            warn!("Retry delay is zero, failed requests will be retried immediately");
        }

        Ok(())
    }

    /// Fixed delay between attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Per-request timeout for the HTTP client
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
