//! Application configuration
//!
//! Settings are read from an optional YAML file. Every field has a default, so
//! an empty file (or no file at all) yields a working setup against the public
//! PokeAPI with a DuckDB cache in the working directory.
//!
//! ```yaml
//! api:
//!   base_url: "https://pokeapi.co/api/v2"
//!   timeout_seconds: 30
//!   max_retries: 3
//!   rate_limit:
//!     requests_per_second: 20
//!     burst_size: 20
//! paging:
//!   page_size: 20
//!   remote_limit: 100
//!   detail_concurrency: 8
//!   language: en
//! storage:
//!   backend: duckdb
//!   path: pokedex.duckdb
//! ```

use crate::details::DEFAULT_LANGUAGE;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::paging::{MediatorConfig, DEFAULT_DETAIL_CONCURRENCY, DEFAULT_PAGE_SIZE, DEFAULT_REMOTE_LIMIT};
use crate::remote::DEFAULT_BASE_URL;
use crate::types::{BackoffType, StorageBackend};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote API access
    pub api: ApiConfig,

    /// Paging behaviour
    pub paging: PagingSettings,

    /// Local cache
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // serde_yaml reads an empty document as null
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or break paging
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api.base_url).map_err(|e| {
            Error::invalid_value("api.base_url", format!("'{}': {e}", self.api.base_url))
        })?;
        if self.api.timeout_seconds == 0 {
            return Err(Error::invalid_value("api.timeout_seconds", "must be at least 1"));
        }
        if self.paging.page_size == 0 {
            return Err(Error::invalid_value("paging.page_size", "must be at least 1"));
        }
        if self.paging.remote_limit == 0 {
            return Err(Error::invalid_value("paging.remote_limit", "must be at least 1"));
        }
        if self.paging.detail_concurrency == 0 {
            return Err(Error::invalid_value(
                "paging.detail_concurrency",
                "must be at least 1",
            ));
        }
        if self.paging.language.trim().is_empty() {
            return Err(Error::missing_field("paging.language"));
        }
        if self.storage.backend == StorageBackend::Duckdb && self.storage.path.as_os_str().is_empty() {
            return Err(Error::missing_field("storage.path"));
        }
        Ok(())
    }

    /// HTTP client settings derived from the `api` section
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(self.api.base_url.clone())
            .timeout(Duration::from_secs(self.api.timeout_seconds))
            .max_retries(self.api.max_retries)
            .backoff(
                self.api.backoff.backoff_type,
                Duration::from_millis(self.api.backoff.initial_ms),
                Duration::from_millis(self.api.backoff.max_ms),
            );
        builder = match &self.api.rate_limit {
            Some(rate_limit) => builder.rate_limit(rate_limit.clone()),
            None => builder.no_rate_limit(),
        };
        builder.build()
    }

    /// Mediator settings derived from the `paging` section
    pub fn mediator_config(&self) -> MediatorConfig {
        MediatorConfig {
            remote_limit: self.paging.remote_limit,
            detail_concurrency: self.paging.detail_concurrency,
        }
    }
}

// ============================================================================
// API
// ============================================================================

/// Remote API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the PokeAPI v2 endpoints
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Client-side rate limit; `null` disables it
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffConfig::default(),
            rate_limit: default_rate_limit(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rate_limit() -> Option<RateLimiterConfig> {
    Some(RateLimiterConfig::default())
}

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    200
}

fn default_max_ms() -> u64 {
    30_000
}

// ============================================================================
// Paging
// ============================================================================

/// Paging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagingSettings {
    /// Rows per consumer page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// `limit` sent to the list endpoint
    #[serde(default = "default_remote_limit")]
    pub remote_limit: u32,

    /// Detail requests in flight per list page
    #[serde(default = "default_detail_concurrency")]
    pub detail_concurrency: usize,

    /// Flavor text language
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            remote_limit: default_remote_limit(),
            detail_concurrency: default_detail_concurrency(),
            language: default_language(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_remote_limit() -> u32 {
    DEFAULT_REMOTE_LIMIT
}

fn default_detail_concurrency() -> usize {
    DEFAULT_DETAIL_CONCURRENCY
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

// ============================================================================
// Storage
// ============================================================================

/// Local cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Cache implementation
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database file for the DuckDB backend
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_path(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("pokedex.duckdb")
}
