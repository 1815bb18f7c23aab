//! Application configuration
//!
//! Configuration loaded from `.rboard.toml`.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable that overrides `server_url`
pub const SERVER_URL_ENV: &str = "RBOARD_URL";

/// Application configuration loaded from `.rboard.toml`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the Review Board server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Pre-fills the login prompt
    #[serde(default)]
    pub username: Option<String>,

    /// Review requests per listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Perforce client binary used for servers older than 3.0
    #[serde(default = "default_p4_command")]
    pub p4_command: String,

    #[serde(default)]
    pub p4_port: Option<String>,

    #[serde(default)]
    pub p4_user: Option<String>,

    #[serde(default)]
    pub p4_client: Option<String>,

    /// File the config was read from, `None` when running on defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

fn default_server_url() -> String {
    "http://demo.reviewboard.org".to_string()
}

fn default_page_size() -> usize {
    25
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_p4_command() -> String {
    "p4".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            username: None,
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            p4_command: default_p4_command(),
            p4_port: None,
            p4_user: None,
            p4_client: None,
            source: None,
        }
    }
}

impl AppConfig {
    /// Load config from the first file of
    /// [`config_candidates`](crate::config_file::config_candidates), or use
    /// defaults
    ///
    /// `RBOARD_URL` wins over the file's `server_url`.
    pub fn load() -> Self {
        let config = match crate::load_config_file() {
            Some(file) => Self {
                source: Some(file.path),
                ..Self::from_toml(&file.content)
            },
            None => {
                log::debug!("Using default app config");
                Self::default()
            }
        };
        config.with_overrides(|name| env::var(name).ok())
    }

    /// Where the settings came from, for log output
    pub fn source_description(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "built-in defaults".to_string(),
        }
    }

    /// Parse TOML content, falling back to defaults on errors
    pub fn from_toml(content: &str) -> Self {
        match toml::from_str(content) {
            Ok(config) => {
                log::info!("Loaded app config from file");
                config
            }
            Err(e) => {
                log::warn!("Failed to parse config file: {}", e);
                Self::default()
            }
        }
    }

    /// Apply environment overrides read through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(SERVER_URL_ENV).filter(|url| !url.trim().is_empty()) {
            log::debug!("{} overrides server_url with {}", SERVER_URL_ENV, url);
            self.server_url = url;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
