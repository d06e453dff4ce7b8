//! Failure taxonomy for webhook signature checks.

use axum::http::StatusCode;
use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::keys::KeyResolutionError;

/// Why a webhook signature was not accepted.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("signature header is missing")]
    MissingSignature,

    #[error("signature header is not visible ASCII")]
    UnreadableSignature,

    #[error("signature has {segments} segments, expected 3")]
    MalformedSignature { segments: usize },

    #[error("reassembled JWS could not be parsed: {0}")]
    Serialization(String),

    #[error("could not resolve verification key: {0}")]
    KeyResolution(#[from] KeyResolutionError),

    #[error("algorithm {0:?} is not permitted, only PS256")]
    DisallowedAlgorithm(Algorithm),

    #[error("signature verification failed: {0}")]
    Verification(String),

    #[error("signature does not match request body")]
    NotVerified,
}

impl VerifyError {
    /// HTTP status returned to the webhook sender.
    ///
    /// Only a missing or structurally broken header is reported as a client
    /// error; every later failure is a 500.
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VerifyError::MissingSignature
                | VerifyError::UnreadableSignature
                | VerifyError::MalformedSignature { .. }
        )
    }

    /// Short snake_case name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::MissingSignature => "missing_signature",
            VerifyError::UnreadableSignature => "unreadable_signature",
            VerifyError::MalformedSignature { .. } => "malformed_signature",
            VerifyError::Serialization(_) => "serialization_error",
            VerifyError::KeyResolution(_) => "key_resolution_error",
            VerifyError::DisallowedAlgorithm(_) => "disallowed_algorithm",
            VerifyError::Verification(_) => "verification_error",
            VerifyError::NotVerified => "not_verified",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            VerifyError::MissingSignature.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            VerifyError::UnreadableSignature.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            VerifyError::MalformedSignature { segments: 2 }.status_code(),
            StatusCode::BAD_REQUEST
        );

        let server_side = [
            VerifyError::Serialization("bad header".to_string()),
            VerifyError::KeyResolution(KeyResolutionError::MissingKeyId),
            VerifyError::DisallowedAlgorithm(Algorithm::RS256),
            VerifyError::Verification("bad base64".to_string()),
            VerifyError::NotVerified,
        ];
        for err in server_side {
            assert_eq!(
                err.status_code(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "{}",
                err.kind()
            );
        }
    }

    #[test]
    fn test_display() {
        let err = VerifyError::MalformedSignature { segments: 4 };
        assert_eq!(err.to_string(), "signature has 4 segments, expected 3");

        let err = VerifyError::from(KeyResolutionError::KeyNotFound {
            kid: "k9".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "could not resolve verification key: no key with kid \"k9\" in key set"
        );
    }
}
