use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENDPOINT_ENV: &str = "GENIE_ENDPOINT";
pub const API_PATH_ENV: &str = "GENIE_API_PATH";
pub const MODEL_ENV: &str = "GENIE_MODEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamProtocol {
    #[default]
    Data,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub api_path: String,
    pub model: Option<String>,
    pub stream_protocol: StreamProtocol,
    pub assistant_name: String,
    pub copy_feedback_ms: u64,
    pub refocus_delay_ms: u64,
    pub compact_breakpoint: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000".to_string(),
            api_path: "/api/chat".to_string(),
            model: None,
            stream_protocol: StreamProtocol::Data,
            assistant_name: "Genie".to_string(),
            copy_feedback_ms: 2000,
            refocus_delay_ms: 100,
            compact_breakpoint: 480.0,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENDPOINT_ENV) {
            self.endpoint = endpoint;
        }
        if let Some(api_path) = lookup(API_PATH_ENV) {
            self.api_path = api_path;
        }
        if let Some(model) = lookup(MODEL_ENV) {
            self.model = Some(model).filter(|model| !model.trim().is_empty());
        }
    }

    pub fn chat_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        if self.api_path.starts_with('/') {
            format!("{base}{}", self.api_path)
        } else {
            format!("{base}/{}", self.api_path)
        }
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }

    pub fn refocus_delay(&self) -> Duration {
        Duration::from_millis(self.refocus_delay_ms)
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("genie").join("config.json"))
    }
}
