use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Backend origin, e.g. "https://api.qapac.example".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Seconds between driver position reports.
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
    /// Seconds between rider-facing nearby-vehicle refreshes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Default radius for nearby queries, in meters.
    #[serde(default = "default_radius")]
    pub nearby_radius_meters: f64,
    /// Overall HTTP request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP connect timeout.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Where the session document is persisted.
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_report_interval() -> u64 {
    10
}

fn default_refresh_interval() -> u64 {
    10
}

fn default_radius() -> f64 {
    500.0
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_session_file() -> PathBuf {
    PathBuf::from("data/session.json")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: default_base_url(),
            report_interval_secs: default_report_interval(),
            refresh_interval_secs: default_refresh_interval(),
            nearby_radius_meters: default_radius(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            session_file: default_session_file(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}
