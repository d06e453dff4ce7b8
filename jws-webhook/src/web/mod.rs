//! Web server module for receiving signed webhooks.
//!
//! This module provides a small web server that:
//! - Receives webhooks on `POST /`
//! - Verifies the detached JWS in the signature header against the body
//! - Answers with an empty 200, 400 or 500

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, receive_webhook, AppState, HealthResponse};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(receive_webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
