//! HTTP client module
//!
//! Provides the JSON HTTP client used for both the bulk and REST APIs.
//!
//! # Features
//!
//! - **ApiClient trait**: the narrow GET/POST JSON interface the engine uses
//! - **Retries**: exponential backoff for GET requests only
//! - **Rate Limiting**: token bucket rate limiter using governor
//! - **Authentication**: integration with the auth module

mod client;
mod rate_limit;

pub use client::{ApiClient, HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
