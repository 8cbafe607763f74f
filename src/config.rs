//! Client-wide configuration assembled from defaults and the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ApiConfig;
use crate::audio::CaptureConfig;

/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "CHATVOX_API_URL";
/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "CHATVOX_TIMEOUT_SECS";
/// Environment variable holding the RMS silence threshold.
pub const SILENCE_THRESHOLD_ENV: &str = "CHATVOX_SILENCE_THRESHOLD";
/// Environment variable holding the silence timeout in milliseconds.
pub const SILENCE_TIMEOUT_ENV: &str = "CHATVOX_SILENCE_TIMEOUT_MS";
/// Environment variable holding the recording ceiling in seconds.
pub const MAX_RECORDING_ENV: &str = "CHATVOX_MAX_RECORDING_SECS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// A URL could not be parsed.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// An environment variable holds an unparsable value.
    #[error("environment variable {var} has invalid value {value:?}")]
    Env {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Top-level configuration for the client.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Assistant API settings.
    pub api: ApiConfig,
    /// Voice capture settings.
    pub capture: CaptureConfig,
}

impl ClientConfig {
    /// Build a configuration from defaults overridden by `CHATVOX_*` variables.
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed, or the result is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration using an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed, or the result is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_ENV) {
            config.api.base_url = url;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, TIMEOUT_ENV)? {
            config.api.request_timeout = Duration::from_secs(secs);
        }
        if let Some(threshold) = parse_var::<f32>(&lookup, SILENCE_THRESHOLD_ENV)? {
            config.capture.silence_threshold = threshold;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, SILENCE_TIMEOUT_ENV)? {
            config.capture.silence_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, MAX_RECORDING_ENV)? {
            config.capture.max_duration = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Override the API base URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api.base_url = url.into();
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any section is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        self.capture.validate()
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
    }
}

/// Serde module for Duration serialization as whole milliseconds.
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
