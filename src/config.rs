//! Configuration management for Veristep

use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Harness configuration
///
/// Values come from defaults, then an optional TOML file, then `VERISTEP_*`
/// environment variables, later sources winning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL relative scenario URLs resolve against
    pub base_url: String,

    /// Default wait bound for conditions and actionability, in milliseconds
    pub default_timeout_ms: u64,

    /// Escalated bound for the single navigation retry, in milliseconds.
    /// Unset means double the failing attempt's bound.
    pub navigation_retry_timeout_ms: Option<u64>,

    /// Run the browser without a visible UI
    pub headless: bool,

    /// Chrome executable path; probed from well-known names when unset
    pub chrome_path: Option<String>,

    /// Existing DevTools endpoint to attach to instead of launching
    pub cdp_endpoint: Option<String>,

    /// Directory relative screenshot paths resolve against
    pub artifact_dir: String,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".to_string(),
            default_timeout_ms: 10_000,
            navigation_retry_timeout_ms: None,
            headless: true,
            chrome_path: None,
            cdp_endpoint: None,
            artifact_dir: ".".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables over defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from the `VERISTEP_CONFIG` file (when set) with
    /// environment overrides applied on top
    pub fn load() -> Result<Self> {
        let mut config = match env::var("VERISTEP_CONFIG") {
            Ok(path) => Config::from_file(&path)?,
            Err(_) => Config::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(base_url) = env::var("VERISTEP_BASE_URL") {
            self.base_url = base_url;
        }

        if let Ok(timeout) = env::var("VERISTEP_DEFAULT_TIMEOUT_MS") {
            self.default_timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid VERISTEP_DEFAULT_TIMEOUT_MS"))?;
        }

        if let Ok(timeout) = env::var("VERISTEP_NAV_RETRY_TIMEOUT_MS") {
            self.navigation_retry_timeout_ms = Some(
                timeout
                    .parse()
                    .map_err(|_| Error::configuration("Invalid VERISTEP_NAV_RETRY_TIMEOUT_MS"))?,
            );
        }

        if let Ok(headless) = env::var("VERISTEP_HEADLESS") {
            self.headless = headless
                .parse()
                .map_err(|_| Error::configuration("Invalid VERISTEP_HEADLESS"))?;
        }

        if let Ok(chrome_path) = env::var("VERISTEP_CHROME_PATH") {
            self.chrome_path = Some(chrome_path);
        }

        if let Ok(endpoint) = env::var("VERISTEP_CDP_ENDPOINT") {
            self.cdp_endpoint = Some(endpoint);
        }

        if let Ok(dir) = env::var("VERISTEP_ARTIFACT_DIR") {
            self.artifact_dir = dir;
        }

        if let Ok(log_level) = env::var("VERISTEP_LOG_LEVEL") {
            self.log_level = log_level;
        }

        Ok(())
    }

    /// Wait bound for a step: the step's own timeout or the default
    pub fn wait_timeout(&self, step_timeout_ms: Option<u64>) -> Duration {
        Duration::from_millis(step_timeout_ms.unwrap_or(self.default_timeout_ms))
    }

    /// Escalated bound for the retried navigation attempt
    pub fn retry_timeout(&self, initial: Duration) -> Duration {
        match self.navigation_retry_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => initial * 2,
        }
    }
}
