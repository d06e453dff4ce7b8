//! Webhook endpoint handlers.
//!
//! The webhook handler only:
//! 1. Reads the signature header and the raw body
//! 2. Hands both to the [`SignatureVerifier`]
//! 3. Maps the outcome to an empty-bodied status code

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::jws::{SignatureVerifier, VerifyError};
use crate::keys::KeyResolver;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: SignatureVerifier,
}

impl AppState {
    pub fn new(config: Config, resolver: Arc<dyn KeyResolver>) -> Self {
        Self {
            config: Arc::new(config),
            verifier: SignatureVerifier::new(resolver),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Signed Webhook
// =============================================================================

/// Signed webhook endpoint.
///
/// Responds `200` when the body carries a valid signature, `400` when the
/// signature header is missing or malformed, and `500` for anything else.
/// Response bodies are always empty.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let header_name = &state.config.signature_header;

    info!(
        header = %header_name,
        has_signature = headers.contains_key(header_name),
        body_length = body.len(),
        "webhook_received"
    );

    let result = match headers.get(header_name) {
        None => Err(VerifyError::MissingSignature),
        Some(value) => match value.to_str() {
            Ok(signature) => state.verifier.verify(signature, &body).await,
            Err(_) => Err(VerifyError::UnreadableSignature),
        },
    };

    match result {
        Ok(()) => {
            info!(body_length = body.len(), "webhook_signature_verified");
            StatusCode::OK
        }
        Err(e) => {
            let status = e.status_code();
            warn!(
                header = %header_name,
                error_kind = e.kind(),
                error = %e,
                status_code = status.as_u16(),
                "webhook_rejected"
            );
            status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::StaticKeyResolver;

    fn state() -> AppState {
        let config = Config::from_lookup(|_| None).unwrap();
        AppState::new(config, Arc::new(StaticKeyResolver::new()))
    }

    #[tokio::test]
    async fn test_missing_header_is_bad_request() {
        let status =
            receive_webhook(State(state()), HeaderMap::new(), Bytes::from_static(b"{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_ascii_header_is_bad_request() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-jws-signature",
            axum::http::HeaderValue::from_bytes(b"h\xff..s").unwrap(),
        );

        let status = receive_webhook(State(state()), headers, Bytes::from_static(b"{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_segment_count_is_bad_request() {
        let mut headers = HeaderMap::new();
        headers.insert("x-jws-signature", "a.b".parse().unwrap());

        let status = receive_webhook(State(state()), headers, Bytes::from_static(b"{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(response) = health().await;
        assert_eq!(response.status, "ok");
    }
}
