//! Orchestrator configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EngineCategory, Result, SafeSearch, SearchError};

/// Defaults applied to every search, plus processor policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Results per page when the caller does not set one.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Language used when the caller does not set one.
    #[serde(default = "default_language")]
    pub language: String,
    /// Locale used when the caller does not set one.
    #[serde(default)]
    pub locale: Option<String>,
    /// Categories searched when neither categories nor engines are requested.
    #[serde(default = "default_categories")]
    pub categories: Vec<EngineCategory>,
    /// Shared deadline for a search, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Upper bound for caller timeout overrides, in milliseconds.
    #[serde(default = "default_max_timeout_ms")]
    pub max_timeout_ms: u64,
    /// How long a failing engine stays suspended, in seconds.
    #[serde(default = "default_suspend_cooldown")]
    pub suspend_cooldown: u64,
    /// Safe search level when the caller does not set one.
    #[serde(default)]
    pub safesearch: SafeSearch,
    /// Maximum number of engines queried at once (unbounded when unset).
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

fn default_page_size() -> usize {
    10
}

fn default_language() -> String {
    "all".to_string()
}

fn default_categories() -> Vec<EngineCategory> {
    vec![EngineCategory::General]
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_timeout_ms() -> u64 {
    30_000
}

fn default_suspend_cooldown() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            language: default_language(),
            locale: None,
            categories: default_categories(),
            timeout_ms: default_timeout_ms(),
            max_timeout_ms: default_max_timeout_ms(),
            suspend_cooldown: default_suspend_cooldown(),
            safesearch: SafeSearch::Off,
            max_concurrency: None,
        }
    }
}

impl Config {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| SearchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(text).map_err(|e| SearchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file. `.json` files are read as JSON, anything
    /// else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SearchError::Config(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(SearchError::Config("page_size must be at least 1".into()));
        }
        if self.timeout_ms == 0 {
            return Err(SearchError::Config("timeout_ms must be positive".into()));
        }
        if self.max_timeout_ms < self.timeout_ms {
            return Err(SearchError::Config(
                "max_timeout_ms must not be below timeout_ms".into(),
            ));
        }
        if self.max_concurrency == Some(0) {
            return Err(SearchError::Config("max_concurrency must be at least 1".into()));
        }
        Ok(())
    }

    /// Returns the default search deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the effective deadline for a caller override: the override
    /// clamped to the maximum, or the default when absent.
    pub fn effective_timeout(&self, requested: Option<Duration>) -> Duration {
        match requested {
            Some(t) => t.min(Duration::from_millis(self.max_timeout_ms)),
            None => self.timeout(),
        }
    }

    /// Returns the suspension cooldown.
    pub fn suspend_cooldown(&self) -> Duration {
        Duration::from_secs(self.suspend_cooldown)
    }
}
