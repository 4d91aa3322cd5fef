use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::constants;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub tmdb: TmdbConfig,

    pub appwrite: AppwriteConfig,

    pub search: SearchConfig,

    pub server: ServerConfig,

    pub observability: ObservabilityConfig,
}

/// Raised when a required setting is absent. Startup cannot proceed past it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("invalid setting `{setting}`: {reason}")]
    Invalid {
        setting: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human readable format.
    pub json_logs: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// View event bus buffer size (default: 100)
    pub event_bus_buffer_size: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            worker_threads: 2,
            event_bus_buffer_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub base_url: String,

    /// Read access token, sent as a bearer token.
    pub api_key: String,

    pub image_base_url: String,

    pub poster_size: String,

    pub request_timeout_seconds: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: constants::tmdb::DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            image_base_url: constants::tmdb::DEFAULT_IMAGE_BASE_URL.to_string(),
            poster_size: constants::tmdb::DEFAULT_POSTER_SIZE.to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppwriteConfig {
    pub endpoint: String,

    pub project_id: String,

    pub database_id: String,

    pub collection_id: String,

    /// Server API key. Optional when the collection grants anonymous access.
    pub api_key: Option<String>,

    pub request_timeout_seconds: u64,
}

impl Default for AppwriteConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            project_id: String::new(),
            database_id: String::new(),
            collection_id: String::new(),
            api_key: None,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: u64::try_from(constants::intervals::SEARCH_DEBOUNCE.as_millis())
                .unwrap_or(500),
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub const fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 5173,
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies `.env` and process
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;

        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from: {}", path.display());
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Overrides file values with any variable `lookup` resolves.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *target = value;
            }
        };

        set(&mut self.tmdb.api_key, "TMDB_API_KEY");
        set(&mut self.tmdb.base_url, "TMDB_BASE_URL");
        set(&mut self.appwrite.endpoint, "APPWRITE_ENDPOINT");
        set(&mut self.appwrite.project_id, "APPWRITE_PROJECT_ID");
        set(&mut self.appwrite.database_id, "APPWRITE_DATABASE_ID");
        set(&mut self.appwrite.collection_id, "APPWRITE_COLLECTION_ID");

        if let Some(key) = lookup("APPWRITE_API_KEY").filter(|v| !v.is_empty()) {
            self.appwrite.api_key = Some(key);
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("cinetrend").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".cinetrend").join("config.toml"));
        }

        paths
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = PathBuf::from("config.toml");
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    /// Checks the settings every collaborator needs. The Appwrite block is
    /// skipped when trending records live in process memory.
    pub fn validate(&self, require_store: bool) -> Result<(), ConfigError> {
        if self.tmdb.base_url.is_empty() {
            return Err(ConfigError::Missing("tmdb.base_url"));
        }

        if self.tmdb.api_key.is_empty() {
            return Err(ConfigError::Missing("tmdb.api_key"));
        }

        if require_store {
            self.validate_store()?;
        }

        url::Url::parse(&self.tmdb.base_url).map_err(|e| ConfigError::Invalid {
            setting: "tmdb.base_url",
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Checks only the Appwrite settings.
    pub fn validate_store(&self) -> Result<(), ConfigError> {
        let required = [
            ("appwrite.endpoint", &self.appwrite.endpoint),
            ("appwrite.project_id", &self.appwrite.project_id),
            ("appwrite.database_id", &self.appwrite.database_id),
            ("appwrite.collection_id", &self.appwrite.collection_id),
        ];

        if let Some((name, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(ConfigError::Missing(*name));
        }

        url::Url::parse(&self.appwrite.endpoint).map_err(|e| ConfigError::Invalid {
            setting: "appwrite.endpoint",
            reason: e.to_string(),
        })?;

        Ok(())
    }
}
