//! JWS Webhook - signed webhook receiver.
//!
//! Webhook senders sign the raw request body as a detached JWS and send it in
//! the `X-JWS-Signature` header. This library rebuilds the token around the
//! received body, resolves the signing key from a JWKS endpoint and verifies
//! it with PS256.
//!
//! ## Architecture
//!
//! ```text
//! POST / → web::receive_webhook → jws::SignatureVerifier → keys::KeyResolver → JWKS
//! ```

pub mod config;
pub mod jws;
pub mod keys;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use jws::{CompactJws, SignatureVerifier, VerifyError};
pub use keys::{JwksKeyResolver, KeyResolutionError, KeyResolver, StaticKeyResolver};
pub use web::AppState;
