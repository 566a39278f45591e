//! HTTP client with retry and rate limiting
//!
//! Provides the JSON client the engine talks to:
//! - Base URL joining for API paths
//! - Rate limiting shared across all requests
//! - Retries with exponential backoff for idempotent reads only
//! - Non-success statuses surfaced as errors

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// The narrow JSON interface the sync engine needs from a transport
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// GET a path and parse the JSON body
    async fn get_json(&self, path: &str, request: RequestConfig) -> Result<Value>;

    /// POST to a path and parse the JSON body
    async fn post_json(&self, path: &str, request: RequestConfig) -> Result<Value>;
}

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries for GET requests
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(300),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            rate_limit: Some(RateLimiterConfig::default()),
            user_agent: format!("tap-eloqua/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff bounds
    pub fn backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, in order
    pub query: Vec<(String, String)>,
    /// Request body (JSON)
    pub body: Option<Value>,
    /// Label used in request logs (e.g. `export_sync_poll`)
    pub endpoint: Option<String>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the endpoint label
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Look up a query parameter
    pub fn get_query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(Error::Http)?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            authenticator: None,
            rate_limiter,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.authenticator = Some(Authenticator::with_client(
            auth_config,
            client.client.clone(),
        ));
        Ok(client)
    }

    /// Set the base URL after construction (once discovered)
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.config.base_url = Some(base_url.into());
    }

    /// Base URL relative paths resolve against
    pub fn base_url(&self) -> Option<&str> {
        self.config.base_url.as_deref()
    }

    /// The authenticator, if any
    pub fn authenticator(&self) -> Option<&Authenticator> {
        self.authenticator.as_ref()
    }

    /// Make a request, retrying transient failures when the method is GET
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        config: &RequestConfig,
    ) -> Result<Response> {
        let full_url = self.build_url(path)?;
        let endpoint = config.endpoint.as_deref().unwrap_or(path);
        // Creation calls (POST) are not idempotent and are never re-sent.
        let max_retries = if method == Method::GET {
            self.config.max_retries
        } else {
            0
        };

        let mut attempt = 0;
        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self.client.request(method.clone(), full_url.clone());
            if !config.query.is_empty() {
                req = req.query(&config.query);
            }
            if let Some(ref body) = config.body {
                req = req.json(body);
            }
            if let Some(ref auth) = self.authenticator {
                req = auth.apply(req).await?;
            }

            let started = Instant::now();
            let result = req.send().await;
            debug!(
                "{method} {endpoint} finished in {}ms",
                started.elapsed().as_millis()
            );

            let error = match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == StatusCode::UNAUTHORIZED {
                        if let Some(ref auth) = self.authenticator {
                            auth.invalidate().await;
                        }
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = extract_retry_after(&response);
                        if attempt < max_retries {
                            warn!(
                                "{endpoint} rate limited (429), attempt {}/{}, waiting {retry_after}s",
                                attempt + 1,
                                max_retries + 1
                            );
                            tokio::time::sleep(Duration::from_secs(retry_after)).await;
                            attempt += 1;
                            continue;
                        }
                        return Err(Error::RateLimited {
                            retry_after_seconds: retry_after,
                        });
                    }

                    let body = response.text().await.unwrap_or_default();
                    Error::http_status(status.as_u16(), body)
                }
                Err(e) if e.is_timeout() => Error::Timeout {
                    timeout_ms: self.config.timeout.as_millis() as u64,
                },
                Err(e) => Error::Http(e),
            };

            if error.is_retryable() && attempt < max_retries {
                let delay = self.calculate_backoff(attempt);
                warn!(
                    "{endpoint} failed ({error}), attempt {}/{}, retrying in {delay:?}",
                    attempt + 1,
                    max_retries + 1
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(error);
        }
    }

    /// Make a request and parse the JSON response; an empty body is `null`
    pub async fn request_json(
        &self,
        method: Method,
        path: &str,
        config: &RequestConfig,
    ) -> Result<Value> {
        let response = self.request(method, path, config).await?;
        let text = response.text().await.map_err(Error::Http)?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        let url = match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                Url::parse(&format!("{base}/{path}"))?
            }
            None => Url::parse(path)?,
        };
        Ok(url)
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        std::cmp::min(
            self.config.initial_backoff.saturating_mul(factor),
            self.config.max_backoff,
        )
    }
}

#[async_trait]
impl ApiClient for HttpClient {
    async fn get_json(&self, path: &str, request: RequestConfig) -> Result<Value> {
        self.request_json(Method::GET, path, &request).await
    }

    async fn post_json(&self, path: &str, request: RequestConfig) -> Result<Value> {
        self.request_json(Method::POST, path, &request).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_authenticator", &self.authenticator.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Extract retry-after header value
fn extract_retry_after(response: &Response) -> u64 {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(60)
}
