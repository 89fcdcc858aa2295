//! Runtime configuration with environment overrides.
//!
//! Defaults mirror the original deployment (RapidAPI download endpoint,
//! 720p target quality, generous media-transfer timeouts) and every value
//! can be overridden through an `OFFTUBE_*` environment variable. Values
//! are range-validated before the library is opened.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default download API base URL.
pub const DEFAULT_API_BASE_URL: &str =
    "https://youtube-quick-video-downloader-free-api-downlaod-all-video.p.rapidapi.com";

/// Default download API host header value.
pub const DEFAULT_API_HOST: &str =
    "youtube-quick-video-downloader-free-api-downlaod-all-video.p.rapidapi.com";

/// Default media directory, relative to the working directory.
pub const DEFAULT_MEDIA_DIR: &str = "offtube-media";

/// Default request timeout for resolver calls (seconds).
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout for media downloads (seconds).
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default read timeout for media downloads (seconds, large files).
const DEFAULT_READ_TIMEOUT_SECS: u64 = 300;

/// Default number of resolve attempts (including the first).
const DEFAULT_RESOLVE_ATTEMPTS: u32 = 3;

/// Default fixed backoff between resolve attempts (seconds).
const DEFAULT_RESOLVE_BACKOFF_SECS: u64 = 2;

/// Error for configuration values outside their accepted range.
#[derive(Debug, Error)]
#[error("invalid config value for `{field}`: {value}. Expected {expected}")]
pub struct ConfigError {
    /// Name of the offending field or environment variable.
    pub field: &'static str,
    /// The rejected value, rendered for the message.
    pub value: String,
    /// Human-readable description of the accepted range.
    pub expected: &'static str,
}

/// Connection settings for the download API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the download API.
    pub base_url: String,
    /// API key sent as `x-rapidapi-key`.
    pub api_key: String,
    /// Host sent as `x-rapidapi-host`.
    pub host: String,
    /// Whole-request timeout for resolver calls.
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            host: DEFAULT_API_HOST.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        }
    }
}

/// Application configuration for the library and its transports.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding media files and `metadata.json`.
    pub media_dir: PathBuf,
    /// Download API connection settings.
    pub api: ApiConfig,
    /// Preferred quality rank for variant selection.
    pub target_quality: u32,
    /// Resolve attempts, including the initial one.
    pub resolve_attempts: u32,
    /// Fixed backoff between resolve attempts, in seconds.
    pub resolve_backoff_secs: u64,
    /// Connect timeout for media downloads, in seconds.
    pub connect_timeout_secs: u64,
    /// Read timeout for media downloads, in seconds.
    pub read_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            media_dir: PathBuf::from(DEFAULT_MEDIA_DIR),
            api: ApiConfig::default(),
            target_quality: crate::selector::DEFAULT_TARGET_QUALITY,
            resolve_attempts: DEFAULT_RESOLVE_ATTEMPTS,
            resolve_backoff_secs: DEFAULT_RESOLVE_BACKOFF_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment on top of defaults.
    ///
    /// Recognized variables: `OFFTUBE_MEDIA_DIR`, `OFFTUBE_API_BASE_URL`,
    /// `OFFTUBE_API_KEY`, `OFFTUBE_API_HOST`, `OFFTUBE_TARGET_QUALITY`,
    /// `OFFTUBE_RESOLVE_ATTEMPTS`, `OFFTUBE_RESOLVE_BACKOFF_SECS`,
    /// `OFFTUBE_CONNECT_TIMEOUT_SECS`, `OFFTUBE_READ_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set but does not parse or
    /// falls outside its accepted range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(dir) = env::var_os("OFFTUBE_MEDIA_DIR") {
            config.media_dir = PathBuf::from(dir);
        }
        if let Ok(value) = env::var("OFFTUBE_API_BASE_URL") {
            config.api.base_url = value;
        }
        if let Ok(value) = env::var("OFFTUBE_API_KEY") {
            config.api.api_key = value;
        }
        if let Ok(value) = env::var("OFFTUBE_API_HOST") {
            config.api.host = value;
        }
        if let Some(value) = parse_env_u32("OFFTUBE_TARGET_QUALITY")? {
            config.target_quality = value;
        }
        if let Some(value) = parse_env_u32("OFFTUBE_RESOLVE_ATTEMPTS")? {
            config.resolve_attempts = value;
        }
        if let Some(value) = parse_env_u64("OFFTUBE_RESOLVE_BACKOFF_SECS")? {
            config.resolve_backoff_secs = value;
        }
        if let Some(value) = parse_env_u64("OFFTUBE_CONNECT_TIMEOUT_SECS")? {
            config.connect_timeout_secs = value;
        }
        if let Some(value) = parse_env_u64("OFFTUBE_READ_TIMEOUT_SECS")? {
            config.read_timeout_secs = value;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates config values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first out-of-range field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(144..=4320).contains(&self.target_quality) {
            return Err(out_of_range(
                "target_quality",
                self.target_quality.to_string(),
                "range: 144..=4320",
            ));
        }
        if !(1..=10).contains(&self.resolve_attempts) {
            return Err(out_of_range(
                "resolve_attempts",
                self.resolve_attempts.to_string(),
                "range: 1..=10",
            ));
        }
        if self.resolve_backoff_secs > 60 {
            return Err(out_of_range(
                "resolve_backoff_secs",
                self.resolve_backoff_secs.to_string(),
                "range: 0..=60",
            ));
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if self.api.base_url.trim().is_empty() {
            return Err(out_of_range(
                "api.base_url",
                self.api.base_url.clone(),
                "a non-empty http(s) URL",
            ));
        }
        Ok(())
    }

    /// Fixed backoff between resolve attempts as a [`Duration`].
    #[must_use]
    pub fn resolve_backoff(&self) -> Duration {
        Duration::from_secs(self.resolve_backoff_secs)
    }
}

fn out_of_range(field: &'static str, value: String, expected: &'static str) -> ConfigError {
    ConfigError {
        field,
        value,
        expected,
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if !(1..=3600).contains(&value) {
        return Err(out_of_range(field, value.to_string(), "range: 1..=3600"));
    }
    Ok(())
}

fn parse_env_u32(name: &'static str) -> Result<Option<u32>, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|_| out_of_range(name, raw, "an unsigned integer"))
}

fn parse_env_u64(name: &'static str) -> Result<Option<u64>, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| out_of_range(name, raw, "an unsigned integer"))
}
