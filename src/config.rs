use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_CONFIG_FILE: &str = "TASK_CLIENT_CONFIG";
pub const ENV_API_BASE: &str = "TASK_CLIENT_API_BASE";
pub const ENV_TIMEOUT_SECS: &str = "TASK_CLIENT_TIMEOUT_SECS";

const APP_DIR_NAME: &str = "task-client";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// `null` or `0` disables the request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
            log_dir: None,
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_request_timeout_secs() -> Option<u64> {
    Some(30)
}

impl ClientConfig {
    /// Defaults, then the file named by `TASK_CLIENT_CONFIG`, then single-value env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let mut config = match lookup(ENV_CONFIG_FILE) {
            Some(path) => Self::from_file(Path::new(path.trim()))?,
            None => Self::default(),
        };

        if let Some(base) = lookup(ENV_API_BASE) {
            config.api_base = base.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config.request_timeout_secs = Some(secs);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn resolved_log_dir(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR_NAME)
    }
}
