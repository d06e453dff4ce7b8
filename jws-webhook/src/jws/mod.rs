//! Detached JWS handling for webhook bodies.
//!
//! ## Verification Flow
//!
//! ```text
//! header..signature + body → header.base64url(body).signature → resolve kid → PS256 verify
//! ```

pub mod compact;
pub mod error;
pub mod verifier;

pub use compact::{encode_payload, CompactJws};
pub use error::VerifyError;
pub use verifier::{SignatureVerifier, PERMITTED_ALGORITHM};
