//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! backend address, request timeout, where the session is persisted and
//! the last email used to sign in.
//!
//! Configuration is stored at `~/.config/hrdesk/config.json`. The
//! `HRDESK_BASE_URL` and `HRDESK_EMAIL` environment variables override the
//! file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::DEFAULT_BASE_URL;
use crate::api::ApiClient;
use crate::auth::{FileStore, KeyValueStore, KeyringStore, RestorePolicy, SessionManager};

/// Application name used for config/cache directory paths and the keychain service
const APP_NAME: &str = "hrdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_BASE_URL: &str = "HRDESK_BASE_URL";
const ENV_EMAIL: &str = "HRDESK_EMAIL";

/// Where the session pair is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// `session.json` in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    /// `None` leaves the HTTP transport's default in place
    pub request_timeout_secs: Option<u64>,
    pub store: StoreBackend,
    pub restore_policy: RestorePolicy,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            store: StoreBackend::default(),
            restore_policy: RestorePolicy::default(),
            last_email: None,
        }
    }
}

impl Config {
    /// Load from disk (defaults if absent), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        debug!(base_url = %config.base_url, store = ?config.store, "Config loaded");
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(email) = var(ENV_EMAIL).filter(|v| !v.trim().is_empty()) {
            self.last_email = Some(email.trim().to_string());
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        ApiClient::with_timeout(&self.base_url, self.request_timeout())
            .context("Failed to build HTTP client")
    }

    pub fn open_store(&self) -> Result<Box<dyn KeyValueStore>> {
        Ok(match self.store {
            StoreBackend::File => Box::new(FileStore::new(self.cache_dir()?)),
            StoreBackend::Keyring => Box::new(KeyringStore::new(APP_NAME)),
        })
    }

    /// Session manager wired to this configuration's backend and store
    pub fn session_manager(&self) -> Result<SessionManager> {
        Ok(SessionManager::new(self.api_client()?, self.open_store()?)
            .with_policy(self.restore_policy))
    }
}
