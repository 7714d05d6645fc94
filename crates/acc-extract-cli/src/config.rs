//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use acc_extract_docs::InputSource;
use acc_extract_docs::config::{
    DEFAULT_BASE_URL, DEFAULT_CHUNK_SIZE, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SCOPES,
    DEFAULT_TOKEN_PATH,
};

/// Global configuration for acc-extract
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub auth: AuthConfig,
    pub api: ApiConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
    /// Data Extract tables to read urns from; empty means the built-in list
    #[serde(rename = "input")]
    pub inputs: Vec<InputConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(deserialize_with = "deserialize_env_var")]
    pub client_id: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub client_secret: Option<String>,
    pub scopes: Vec<String>,
    pub token_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: std::env::var("APS_CLIENT_ID").ok(),
            client_secret: std::env::var("APS_CLIENT_SECRET").ok(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Unset: wait out every 429 the server sends
    pub max_rate_limit_retries: Option<u32>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            max_rate_limit_retries: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub chunk_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InputConfig {
    pub file: PathBuf,
    pub project_column: String,
    pub urn_column: String,
}

impl From<&InputConfig> for InputSource {
    fn from(input: &InputConfig) -> Self {
        InputSource::new(&input.file, &input.project_column, &input.urn_column)
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./acc-extract.toml (current directory)
    /// 2. ~/.config/acc-extract/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("acc-extract.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "acc-extract") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Configured inputs, or the two standard Data Extract tables
    pub fn input_sources(&self) -> Vec<InputSource> {
        if self.inputs.is_empty() {
            InputSource::defaults()
        } else {
            self.inputs.iter().map(InputSource::from).collect()
        }
    }
}
