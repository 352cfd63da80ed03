use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fallback API address when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the complaint API server
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// File holding the persisted access token
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
        }
    }
}

fn default_token_file() -> PathBuf {
    PathBuf::from("./data/session.json")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).with_context(|| "Failed to parse configuration file")?;
        config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// Apply a base URL supplied at run time (flag or environment).
    pub fn with_api_url(mut self, api_url: Option<&str>) -> Self {
        if let Some(url) = api_url.map(str::trim).filter(|url| !url.is_empty()) {
            self.api.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }
}
