//! Configuration management for the client.

use crate::error::Error;
use crate::kv::FileKeyValueStore;
use crate::remote::{HttpRemoteStore, RemoteStore};
use crate::repository::{HybridRepository, RepositoryOptions};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tally_engine::{MergeStrategy, ValidationPolicy};

/// Default directory for local data.
pub const DEFAULT_DATA_DIR: &str = "./tally-data";

/// Default per-call remote deadline, in seconds.
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Directory of the file-backed local store
    pub data_dir: PathBuf,
    /// Base URL of tally-server; local-only when unset
    pub remote_url: Option<String>,
    /// Repository behavior
    pub options: RepositoryOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            remote_url: None,
            options: RepositoryOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = lookup("TALLY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let remote_url = lookup("TALLY_REMOTE_URL").filter(|url| !url.trim().is_empty());

        let timeout_secs = match lookup("TALLY_REMOTE_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout(raw))?,
            None => DEFAULT_REMOTE_TIMEOUT_SECS,
        };

        let start_online = match lookup("TALLY_START_ONLINE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidStartOnline(raw))?,
            None => true,
        };

        let validation = match lookup("TALLY_VALIDATION") {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidValue)?,
            None => ValidationPolicy::default(),
        };

        let merge_strategy = match lookup("TALLY_MERGE_STRATEGY") {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidValue)?,
            None => MergeStrategy::default(),
        };

        Ok(Self {
            data_dir,
            remote_url,
            options: RepositoryOptions {
                validation,
                merge_strategy,
                remote_timeout: Duration::from_secs(timeout_secs),
                start_online,
            },
        })
    }

    /// Open the file store and, if configured, the HTTP remote, and build a
    /// repository over them.
    pub async fn open_repository(&self) -> Result<HybridRepository, Error> {
        let kv = FileKeyValueStore::open(&self.data_dir).await?;

        let remote = match &self.remote_url {
            Some(url) => Some(Arc::new(HttpRemoteStore::new(url)?) as Arc<dyn RemoteStore>),
            None => None,
        };

        tracing::info!(
            data_dir = %self.data_dir.display(),
            remote = self.remote_url.as_deref().unwrap_or("none"),
            "Opening expense repository"
        );

        Ok(HybridRepository::new(Arc::new(kv), remote, self.options.clone()))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid TALLY_REMOTE_TIMEOUT_SECS value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid TALLY_START_ONLINE value: {0}")]
    InvalidStartOnline(String),

    #[error("{0}")]
    InvalidValue(String),
}
