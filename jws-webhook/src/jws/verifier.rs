//! Detached JWS verification of webhook bodies.
//!
//! The sender signs the raw request body as a PS256 JWS and sends only
//! `header..signature`. Verification rebuilds the token around the body we
//! actually received, so a body altered in transit no longer matches.

use std::sync::Arc;

use jsonwebtoken::{crypto, decode_header, Algorithm};
use tracing::{error, info, warn};

use super::compact::CompactJws;
use super::error::VerifyError;
use crate::keys::{KeyResolutionError, KeyResolver};

/// The only signing algorithm a webhook may use.
pub const PERMITTED_ALGORITHM: Algorithm = Algorithm::PS256;

/// Number of body bytes included in mismatch logs.
const BODY_PREVIEW_BYTES: usize = 256;

/// Checks webhook signatures against keys from a [`KeyResolver`].
#[derive(Clone)]
pub struct SignatureVerifier {
    resolver: Arc<dyn KeyResolver>,
}

impl SignatureVerifier {
    pub fn new(resolver: Arc<dyn KeyResolver>) -> Self {
        Self { resolver }
    }

    /// Verify `signature` (a compact JWS, payload usually empty) over `body`.
    ///
    /// # Returns
    ///
    /// `Ok(())` when the signature is a valid PS256 signature over `body` by
    /// the key named in the JWS header.
    pub async fn verify(&self, signature: &str, body: &[u8]) -> Result<(), VerifyError> {
        let jws = CompactJws::parse(signature).map_err(|e| {
            warn!(signature = %signature, error = %e, "jws_signature_malformed");
            e
        })?;

        let jws = jws.with_body(body);
        let token = jws.to_string();

        let header = decode_header(&token).map_err(|e| {
            error!(signature = %signature, error = %e, "jws_header_invalid");
            VerifyError::Serialization(e.to_string())
        })?;

        if header.alg != PERMITTED_ALGORITHM {
            warn!(
                signature = %signature,
                alg = ?header.alg,
                "jws_algorithm_not_permitted"
            );
            return Err(VerifyError::DisallowedAlgorithm(header.alg));
        }

        let kid = header.kid.as_deref().ok_or_else(|| {
            error!(signature = %signature, "jws_kid_missing");
            KeyResolutionError::MissingKeyId
        })?;

        let key = self.resolver.resolve(kid).await.map_err(|e| {
            error!(signature = %signature, kid = %kid, error = %e, "jws_key_resolution_failed");
            VerifyError::KeyResolution(e)
        })?;

        let verified = crypto::verify(
            jws.signature(),
            jws.signing_input().as_bytes(),
            &key,
            PERMITTED_ALGORITHM,
        )
        .map_err(|e| {
            error!(signature = %signature, kid = %kid, error = %e, "jws_verification_error");
            VerifyError::Verification(e.to_string())
        })?;

        if !verified {
            let preview = &body[..body.len().min(BODY_PREVIEW_BYTES)];
            error!(
                signature = %signature,
                kid = %kid,
                body_length = body.len(),
                body_preview = %String::from_utf8_lossy(preview),
                "jws_signature_not_verified"
            );
            return Err(VerifyError::NotVerified);
        }

        info!(kid = %kid, body_length = body.len(), "jws_signature_verified");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::StaticKeyResolver;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use jsonwebtoken::DecodingKey;

    fn encode_header(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json.as_bytes())
    }

    fn verifier() -> SignatureVerifier {
        let resolver = StaticKeyResolver::new().with_key("k1", DecodingKey::from_secret(b"secret"));
        SignatureVerifier::new(Arc::new(resolver))
    }

    #[tokio::test]
    async fn test_malformed_signature() {
        let err = verifier().verify("only.two", b"{}").await.unwrap_err();
        assert!(matches!(err, VerifyError::MalformedSignature { segments: 2 }));
    }

    #[tokio::test]
    async fn test_header_not_json() {
        let signature = format!("{}..c2ln", encode_header("not json"));
        let err = verifier().verify(&signature, b"{}").await.unwrap_err();
        assert!(matches!(err, VerifyError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_rejects_other_algorithms_before_key_lookup() {
        for alg in ["HS256", "RS256", "PS512"] {
            let header = encode_header(&format!(r#"{{"alg":"{alg}","kid":"k1"}}"#));
            let err = verifier()
                .verify(&format!("{header}..c2ln"), b"{}")
                .await
                .unwrap_err();
            assert!(
                matches!(err, VerifyError::DisallowedAlgorithm(_)),
                "alg {alg}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_kid() {
        let header = encode_header(r#"{"alg":"PS256"}"#);
        let err = verifier()
            .verify(&format!("{header}..c2ln"), b"{}")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerifyError::KeyResolution(KeyResolutionError::MissingKeyId)
        ));
    }

    #[tokio::test]
    async fn test_unknown_kid() {
        let header = encode_header(r#"{"alg":"PS256","kid":"other"}"#);
        let err = verifier()
            .verify(&format!("{header}..c2ln"), b"{}")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerifyError::KeyResolution(KeyResolutionError::KeyNotFound { .. })
        ));
    }
}
