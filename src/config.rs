//! Tap configuration
//!
//! The JSON config file handed to the tap: OAuth2 credentials, the start
//! date for first syncs and a few optional transport settings.

use crate::auth::AuthConfig;
use crate::engine::SyncConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::{JsonValue, Watermark};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Keys every config must carry
pub const REQUIRED_CONFIG_KEYS: [&str; 5] = [
    "start_date",
    "client_id",
    "client_secret",
    "refresh_token",
    "redirect_uri",
];

/// Tap configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Watermark for streams without a bookmark
    pub start_date: String,

    /// OAuth2 client id
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: String,

    /// OAuth2 refresh token
    pub refresh_token: String,

    /// OAuth2 redirect URI registered for the app
    pub redirect_uri: String,

    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Instance base URL; looked up from the id endpoint when absent
    #[serde(default)]
    pub base_url: Option<String>,

    /// Client-side request rate limit
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

impl TapConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate config JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Validate a parsed config
    pub fn from_value(value: JsonValue) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::config("config must be a JSON object"))?;

        for key in REQUIRED_CONFIG_KEYS {
            match object.get(key) {
                None | Some(JsonValue::Null) => return Err(Error::missing_field(key)),
                Some(JsonValue::String(s)) if s.trim().is_empty() => {
                    return Err(Error::invalid_value(key, "must not be empty"))
                }
                Some(JsonValue::String(_)) => {}
                Some(_) => return Err(Error::invalid_value(key, "must be a string")),
            }
        }

        let config: Self = serde_json::from_value(value)?;
        config.start_date()?;
        if config.requests_per_second == Some(0) {
            return Err(Error::invalid_value(
                "requests_per_second",
                "must be greater than zero",
            ));
        }
        Ok(config)
    }

    /// Parsed start date
    pub fn start_date(&self) -> Result<Watermark> {
        Watermark::parse(&self.start_date)
            .map_err(|e| Error::invalid_value("start_date", e.to_string()))
    }

    /// OAuth2 refresh-token auth for this config
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::oauth2_refresh(
            &self.client_id,
            &self.client_secret,
            &self.refresh_token,
            &self.redirect_uri,
        )
    }

    /// HTTP client settings for this config
    pub fn http_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder();
        if let Some(ref base_url) = self.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(ref agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        if let Some(rps) = self.requests_per_second {
            builder = builder.rate_limit(RateLimiterConfig::new(rps, rps));
        }
        builder.build()
    }

    /// Sync settings for this config
    pub fn sync_config(&self) -> Result<SyncConfig> {
        Ok(SyncConfig::new(self.start_date()?))
    }
}

impl std::fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapConfig")
            .field("start_date", &self.start_date)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("user_agent", &self.user_agent)
            .field("base_url", &self.base_url)
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}
