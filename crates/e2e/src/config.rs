//! Harness configuration
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! `CRITIK_*` environment variables. The CLI applies its own flags last.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

/// Environment variable overriding [`HarnessConfig::base_url`]
pub const ENV_BASE_URL: &str = "CRITIK_BASE_URL";
/// Environment variable overriding [`HarnessConfig::health_timeout_secs`]
pub const ENV_HEALTH_TIMEOUT: &str = "CRITIK_HEALTH_TIMEOUT_SECS";
/// Environment variable overriding [`HarnessConfig::request_timeout_secs`]
pub const ENV_REQUEST_TIMEOUT: &str = "CRITIK_REQUEST_TIMEOUT_SECS";

/// Everything a run needs to know about the backend and its fixtures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Root URL of the backend under test
    pub base_url: String,

    /// Timeout for the initial health probe
    pub health_timeout_secs: u64,

    /// Timeout for every other probe
    pub request_timeout_secs: u64,

    /// Password used for both registered actors
    pub password: String,

    /// Username prefix; actors become `<prefix>_a_<ts>` and `<prefix>_b_<ts>`
    pub user_prefix: String,

    /// Domain for generated email addresses
    pub email_domain: String,

    /// Page size passed to every paginated listing
    pub page_size: u32,

    /// Artwork submitted by actor A
    pub artwork: ArtworkFixture,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            health_timeout_secs: 5,
            request_timeout_secs: 30,
            password: "Test@1234".to_string(),
            user_prefix: "test_user".to_string(),
            email_domain: "test.com".to_string(),
            page_size: 10,
            artwork: ArtworkFixture::default(),
        }
    }
}

/// Multipart fields for the artwork upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkFixture {
    pub title: String,
    pub artist_name: String,
    pub interpretation: String,
    pub tags: Vec<String>,
    pub location_name: String,
    pub lat: f64,
    pub lon: f64,
    pub file_name: String,
    pub content_type: String,
}

impl Default for ArtworkFixture {
    fn default() -> Self {
        Self {
            title: "Test Artwork Title".to_string(),
            artist_name: "Test Artist".to_string(),
            interpretation: "This is a test artwork".to_string(),
            tags: vec!["test".to_string(), "abstract".to_string()],
            location_name: "Paris".to_string(),
            lat: 48.8566,
            lon: 2.3522,
            file_name: "test_image.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
        }
    }
}

impl HarnessConfig {
    /// Parse a config from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Parse a config from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Apply `CRITIK_*` overrides from the process environment
    pub fn apply_env(&mut self) -> E2eResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> E2eResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(secs) = lookup(ENV_HEALTH_TIMEOUT) {
            self.health_timeout_secs = parse_secs(ENV_HEALTH_TIMEOUT, &secs)?;
        }
        if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT) {
            self.request_timeout_secs = parse_secs(ENV_REQUEST_TIMEOUT, &secs)?;
        }
        Ok(())
    }

    /// Reject configs that cannot produce a meaningful run
    pub fn validate(&self) -> E2eResult<()> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| E2eError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(E2eError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        if self.health_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(E2eError::InvalidConfig(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if self.user_prefix.trim().is_empty() {
            return Err(E2eError::InvalidConfig("user_prefix must not be empty".to_string()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash, ready for path concatenation
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_secs(key: &str, value: &str) -> E2eResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| E2eError::InvalidConfig(format!("{key} must be a whole number of seconds, got '{value}'")))
}
