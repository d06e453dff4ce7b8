//! Configuration module for environment variable parsing.
//!
//! Every setting has a default, so the receiver starts with no environment at
//! all and verifies against the production JWKS document.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderName;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// JWKS document used when `JWKS_URI` is not set.
pub const DEFAULT_JWKS_URI: &str = "https://api.appfolio.com/.well-known/jwks.json";

/// Header carrying the detached JWS when `SIGNATURE_HEADER` is not set.
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-JWS-Signature";

/// Errors for settings that have no sensible fallback.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JWKS_URI {value:?}: {source}")]
    InvalidJwksUri {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid SIGNATURE_HEADER {value:?}")]
    InvalidSignatureHeader { value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Location of the JSON Web Key Set used to resolve verification keys
    pub jwks_uri: Url,

    /// Name of the request header carrying the detached JWS
    pub signature_header: HeaderName,

    /// Upper bound on a single JWKS fetch, in milliseconds
    pub jwks_fetch_timeout_ms: u64,

    /// How long resolved keys stay cached, in seconds (0 disables the cache)
    pub jwks_cache_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_uri = lookup("JWKS_URI").unwrap_or_else(|| DEFAULT_JWKS_URI.to_string());
        let jwks_uri = Url::parse(raw_uri.trim()).map_err(|source| ConfigError::InvalidJwksUri {
            value: raw_uri.clone(),
            source,
        })?;

        let raw_header =
            lookup("SIGNATURE_HEADER").unwrap_or_else(|| DEFAULT_SIGNATURE_HEADER.to_string());
        let signature_header = HeaderName::from_bytes(raw_header.trim().as_bytes())
            .map_err(|_| ConfigError::InvalidSignatureHeader { value: raw_header })?;

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8000),
            jwks_uri,
            signature_header,
            jwks_fetch_timeout_ms: parse_nonzero_or(&lookup, "JWKS_FETCH_TIMEOUT_MS", 5000),
            jwks_cache_ttl_secs: parse_or(&lookup, "JWKS_CACHE_TTL_SECS", 0),
        })
    }

    pub fn jwks_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.jwks_fetch_timeout_ms)
    }

    /// Cache lifetime for resolved keys, `None` when caching is off.
    pub fn jwks_cache_ttl(&self) -> Option<Duration> {
        match self.jwks_cache_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Parse a numeric variable, falling back to the default on absence or garbage.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy,
{
    let raw = match lookup(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

/// Like [`parse_or`], but a zero value also falls back to the default.
fn parse_nonzero_or<F>(lookup: &F, name: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, name, default) {
        0 => {
            warn!(env_var = name, "Zero is not allowed, using default");
            default
        }
        v => v,
    }
}
