use crate::error::ConfigError;
use crate::monitor::{
    DEFAULT_CHANGE_THRESHOLD, DEFAULT_POLL_INTERVAL, DEFAULT_SNAPSHOT_CHARS, DetectorConfig,
};
use crate::transcript::DEFAULT_KEY_PREFIX;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// URL of the WebDriver server used to read live pages
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Seconds between change-detector samples
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Characters of visible text compared by the change detector
    #[serde(default = "default_snapshot_chars")]
    pub snapshot_chars: usize,

    /// Snapshots this short never count as a change
    #[serde(default = "default_change_threshold")]
    pub change_threshold: usize,

    /// JSON file holding saved transcripts
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Prefix of transcript storage keys
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_snapshot_chars() -> usize {
    DEFAULT_SNAPSHOT_CHARS
}

fn default_change_threshold() -> usize {
    DEFAULT_CHANGE_THRESHOLD
}

fn default_store_path() -> PathBuf {
    PathBuf::from("page-chat-history.json")
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            poll_interval_secs: default_poll_interval_secs(),
            snapshot_chars: default_snapshot_chars(),
            change_threshold: default_change_threshold(),
            store_path: default_store_path(),
            key_prefix: default_key_prefix(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Applies the `WEBDRIVER_URL` environment variable, if set
    pub fn with_env(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    /// Change-detector settings; a zero interval falls back to the default
    pub fn detector(&self) -> DetectorConfig {
        let interval = match self.poll_interval_secs {
            0 => DEFAULT_POLL_INTERVAL,
            secs => Duration::from_secs(secs),
        };
        DetectorConfig {
            interval,
            snapshot_chars: self.snapshot_chars,
            threshold: self.change_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.detector(), DetectorConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = AppConfig::from_json(
            r#"{ "poll_interval_secs": 2, "change_threshold": 10, "store_path": "/tmp/h.json" }"#,
        )
        .unwrap();
        assert_eq!(config.detector().interval, Duration::from_secs(2));
        assert_eq!(config.detector().threshold, 10);
        assert_eq!(config.store_path, PathBuf::from("/tmp/h.json"));
        assert_eq!(config.key_prefix, "chat");
    }

    #[test]
    fn test_zero_interval_falls_back() {
        let config = AppConfig::from_json(r#"{ "poll_interval_secs": 0 }"#).unwrap();
        assert_eq!(config.detector().interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            AppConfig::from_json("{ nope"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            AppConfig::from_file("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
