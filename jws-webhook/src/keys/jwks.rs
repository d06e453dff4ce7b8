//! HTTPS JWKS key resolver.
//!
//! Fetches the key set on every lookup unless a cache TTL is configured, in
//! which case resolved keys are kept per `kid` until they expire.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::DecodingKey;
use moka::sync::Cache;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};
use url::Url;

use super::{KeyResolutionError, KeyResolver};
use crate::Config;

/// Largest JWKS document we are willing to parse.
const MAX_JWKS_BYTES: u64 = 512 * 1024;

/// Upper bound on cached keys.
const MAX_CACHED_KEYS: u64 = 100;

/// A fetched key set whose entries are left unparsed.
///
/// Published sets often mix signing keys with encryption keys or key types
/// the JOSE library does not understand. Only the entry selected by `kid` is
/// ever parsed, so a foreign entry elsewhere in the set does no harm.
#[derive(Debug, Clone, Deserialize)]
pub struct KeySetDocument {
    pub keys: Vec<Value>,
}

impl KeySetDocument {
    /// The raw entry whose `kid` member equals `kid`.
    pub fn find(&self, kid: &str) -> Option<&Value> {
        self.keys
            .iter()
            .find(|entry| entry.get("kid").and_then(Value::as_str) == Some(kid))
    }

    pub fn key_ids(&self) -> Vec<&str> {
        self.keys
            .iter()
            .filter_map(|entry| entry.get("kid").and_then(Value::as_str))
            .collect()
    }
}

/// Resolves keys from a remote JSON Web Key Set.
#[derive(Clone)]
pub struct JwksKeyResolver {
    client: Client,
    jwks_uri: Url,
    timeout: Duration,
    cache: Option<Cache<String, DecodingKey>>,
}

impl JwksKeyResolver {
    /// Create a resolver for `jwks_uri`.
    ///
    /// Every fetch is bounded by `timeout`. With `cache_ttl` set, keys are
    /// reused until they are older than the TTL.
    pub fn new(
        jwks_uri: Url,
        timeout: Duration,
        cache_ttl: Option<Duration>,
    ) -> Result<Self, KeyResolutionError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jws-webhook/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(KeyResolutionError::Client)?;

        let cache = cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(MAX_CACHED_KEYS)
                .time_to_live(ttl)
                .build()
        });

        Ok(Self {
            client,
            jwks_uri,
            timeout,
            cache,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, KeyResolutionError> {
        Self::new(
            config.jwks_uri.clone(),
            config.jwks_fetch_timeout(),
            config.jwks_cache_ttl(),
        )
    }

    pub fn jwks_uri(&self) -> &Url {
        &self.jwks_uri
    }

    /// Download and parse the key set.
    pub async fn fetch(&self) -> Result<KeySetDocument, KeyResolutionError> {
        let uri = self.jwks_uri.to_string();
        info!(uri = %uri, "jwks_fetch_starting");

        let response = self
            .client
            .get(self.jwks_uri.clone())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            error!(uri = %uri, status_code = status.as_u16(), "jwks_fetch_bad_status");
            return Err(KeyResolutionError::Status {
                uri,
                status: status.as_u16(),
            });
        }

        if let Some(len) = response.content_length() {
            if len > MAX_JWKS_BYTES {
                error!(uri = %uri, content_length = len, "jwks_fetch_too_large");
                return Err(KeyResolutionError::TooLarge { bytes: len });
            }
        }

        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        if body.len() as u64 > MAX_JWKS_BYTES {
            error!(uri = %uri, body_length = body.len(), "jwks_fetch_too_large");
            return Err(KeyResolutionError::TooLarge {
                bytes: body.len() as u64,
            });
        }

        let set: KeySetDocument = serde_json::from_slice(&body).map_err(|e| {
            error!(uri = %uri, error = %e, "jwks_document_invalid");
            KeyResolutionError::InvalidDocument(e)
        })?;

        info!(uri = %uri, key_count = set.keys.len(), "jwks_fetch_complete");

        Ok(set)
    }

    fn request_error(&self, e: reqwest::Error) -> KeyResolutionError {
        let uri = self.jwks_uri.to_string();
        if e.is_timeout() {
            error!(
                uri = %uri,
                timeout_ms = self.timeout.as_millis() as u64,
                error = %e,
                "jwks_fetch_timeout"
            );
            KeyResolutionError::Timeout {
                uri,
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            error!(uri = %uri, error = %e, "jwks_fetch_error");
            KeyResolutionError::Fetch { uri, source: e }
        }
    }
}

#[async_trait]
impl KeyResolver for JwksKeyResolver {
    async fn resolve(&self, kid: &str) -> Result<DecodingKey, KeyResolutionError> {
        if let Some(key) = self.cache.as_ref().and_then(|c| c.get(kid)) {
            info!(kid = %kid, "jwks_cache_hit");
            return Ok(key);
        }

        let set = self.fetch().await?;

        let entry = set.find(kid).ok_or_else(|| {
            warn!(kid = %kid, available = ?set.key_ids(), "jwks_key_not_found");
            KeyResolutionError::KeyNotFound {
                kid: kid.to_string(),
            }
        })?;

        let jwk: Jwk = serde_json::from_value(entry.clone()).map_err(|e| {
            warn!(kid = %kid, error = %e, "jwks_key_unparseable");
            KeyResolutionError::UnusableKey {
                kid: kid.to_string(),
                reason: e.to_string(),
            }
        })?;

        let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            warn!(kid = %kid, error = %e, "jwks_key_unusable");
            KeyResolutionError::UnusableKey {
                kid: kid.to_string(),
                reason: e.to_string(),
            }
        })?;

        if let Some(cache) = &self.cache {
            cache.insert(kid.to_string(), key.clone());
        }

        Ok(key)
    }
}
