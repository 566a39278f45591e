//! Authentication module
//!
//! Supports: bearer tokens and the OAuth2 refresh-token grant Eloqua apps use.
//!
//! The `Authenticator` caches the access token and refreshes it when it is
//! about to expire. It also resolves the instance base URL, which differs
//! per Eloqua pod.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, CachedToken, DEFAULT_ID_URL, DEFAULT_TOKEN_URL};
