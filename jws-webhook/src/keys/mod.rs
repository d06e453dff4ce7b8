//! Verification key resolution.
//!
//! A [`KeyResolver`] turns the `kid` from a JWS header into a key that can
//! check the signature. Two implementations ship:
//! - [`JwksKeyResolver`]: fetches a remote JSON Web Key Set over HTTPS
//! - [`StaticKeyResolver`]: fixed in-memory keys, for tests and pinned deployments

pub mod jwks;

use std::collections::HashMap;

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use thiserror::Error;

pub use jwks::JwksKeyResolver;

/// Reasons a key could not be produced for a `kid`.
#[derive(Debug, Error)]
pub enum KeyResolutionError {
    #[error("JWS header carries no key identifier")]
    MissingKeyId,

    #[error("no key with kid {kid:?} in key set")]
    KeyNotFound { kid: String },

    #[error("key {kid:?} cannot be used for verification: {reason}")]
    UnusableKey { kid: String, reason: String },

    #[error("failed to build JWKS client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to fetch JWKS from {uri}: {source}")]
    Fetch {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("JWKS fetch from {uri} timed out after {timeout_ms}ms")]
    Timeout { uri: String, timeout_ms: u64 },

    #[error("JWKS endpoint {uri} returned HTTP {status}")]
    Status { uri: String, status: u16 },

    #[error("JWKS document too large: {bytes} bytes")]
    TooLarge { bytes: u64 },

    #[error("invalid JWKS document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

/// Source of verification keys, looked up by key identifier.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, kid: &str) -> Result<DecodingKey, KeyResolutionError>;
}

/// Resolver over a fixed set of keys.
#[derive(Clone, Default)]
pub struct StaticKeyResolver {
    keys: HashMap<String, DecodingKey>,
}

impl StaticKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key under `kid`, replacing any previous key with that id.
    pub fn with_key(mut self, kid: impl Into<String>, key: DecodingKey) -> Self {
        self.keys.insert(kid.into(), key);
        self
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(&self, kid: &str) -> Result<DecodingKey, KeyResolutionError> {
        self.keys
            .get(kid)
            .cloned()
            .ok_or_else(|| KeyResolutionError::KeyNotFound {
                kid: kid.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_finds_key() {
        let resolver =
            StaticKeyResolver::new().with_key("k1", DecodingKey::from_secret(b"not-an-rsa-key"));

        assert!(resolver.resolve("k1").await.is_ok());
    }

    #[tokio::test]
    async fn test_static_resolver_unknown_kid() {
        let resolver = StaticKeyResolver::new();

        match resolver.resolve("missing").await {
            Err(KeyResolutionError::KeyNotFound { kid }) => assert_eq!(kid, "missing"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("resolved a key that was never added"),
        }
    }
}
