//! Auth configuration types

use chrono::{DateTime, Utc};

/// Default Eloqua OAuth2 token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://login.eloqua.com/auth/oauth2/token";

/// Default endpoint that reports the instance's base URLs
pub const DEFAULT_ID_URL: &str = "https://login.eloqua.com/id";

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Fixed bearer token
    Bearer {
        /// The bearer token
        token: String,
    },

    /// OAuth2 refresh token grant, client credentials sent as HTTP Basic
    Oauth2Refresh {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Refresh token
        refresh_token: String,
        /// Redirect URI registered for the app
        redirect_uri: String,
    },
}

impl AuthConfig {
    /// Refresh-token grant against the default Eloqua token endpoint
    pub fn oauth2_refresh(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self::Oauth2Refresh {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Replace the token endpoint
    #[must_use]
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        if let Self::Oauth2Refresh { token_url, .. } = &mut self {
            *token_url = url.into();
        }
        self
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 60 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + chrono::Duration::seconds(60) >= expires_at,
            None => false,
        }
    }
}
