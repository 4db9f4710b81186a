//! Service configuration, loaded from environment variables.
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Provider credential. Absence is fatal at startup.
    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub openai_model: String,

    #[serde(default = "default_base_url")]
    pub openai_base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub provider_timeout_secs: u64,

    /// JSON array of fallback classifications.
    #[serde(default = "default_mock_data_path")]
    pub mock_data_path: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_mock_data_path() -> String {
    "waste_mock_data.json".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_body_limit_mb() -> usize {
    5
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// The API key, if one is set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }
}
