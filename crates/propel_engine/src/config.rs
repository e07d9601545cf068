use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable that overrides `api_base_url`.
pub const API_BASE_URL_ENV: &str = "PROPEL_API_BASE_URL";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid backend url {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// Single configuration surface shared by the extension relay and the web-client commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropelConfig {
    pub api_base_url: String,
    /// Path of the extension's generation endpoint, relative to `api_base_url`.
    pub generate_path: String,
    pub user_id: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Where the bearer token is kept between runs.
    pub token_path: PathBuf,
    pub page: PageSettings,
}

impl Default for PropelConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8001".to_string(),
            generate_path: "/generate".to_string(),
            user_id: propel_core::PLACEHOLDER_USER_ID.to_string(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 60_000,
            token_path: PathBuf::from(".propel").join("token"),
            page: PageSettings::default(),
        }
    }
}

impl PropelConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Joins `path` onto the base url, tolerating a trailing slash on either side.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        let joined = format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|err| ConfigError::InvalidUrl {
            url: joined,
            message: err.to_string(),
        })
    }

    pub fn generate_endpoint(&self) -> Result<Url, ConfigError> {
        self.endpoint(&self.generate_path)
    }

    /// Applies overrides from a variable lookup (normally `std::env::var`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSettings {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

impl PageSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
