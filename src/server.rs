//! HTTP surface for the token service.
//!
//! Thin request router: three routes bound to the issuer, verifier, and key
//! registry, with every failure rendered as a 400 and the error message as
//! plain text. Route composition lives here so `main` stays small and the
//! router is testable without a listener.

use crate::issuer;
use crate::keys::KeyRegistry;
use crate::labels::ExternalClaims;
use crate::verifier;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<KeyRegistry>,
}

/// Build the service router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/generateToken", post(generate_token))
        .route("/validateToken", post(validate_token))
        .route("/generateKey", get(generate_key))
        // Anything unrouted, including wrong methods on known paths, is a 404.
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ValidateRequest {
    token: String,
}

async fn generate_token(State(state): State<AppState>, body: String) -> Response {
    let claims: ExternalClaims = match serde_json::from_str(&body) {
        Ok(claims) => claims,
        Err(err) => return bad_request(format!("invalid claim JSON: {err}")),
    };

    match issuer::issue(&state.registry, &claims) {
        Ok(token) => (StatusCode::OK, token).into_response(),
        Err(err) => {
            tracing::debug!(error = %err, "token issuance rejected");
            bad_request(err.to_string())
        }
    }
}

async fn validate_token(State(state): State<AppState>, body: String) -> Response {
    let request: ValidateRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(err) => return bad_request(format!("invalid request JSON: {err}")),
    };

    match verifier::verify(&state.registry, &request.token) {
        Ok(payload) => Json(json!({
            "status": "Token is valid",
            "payload": payload,
        }))
        .into_response(),
        Err(err) => {
            tracing::debug!(error = %err, "token rejected");
            bad_request(err.to_string())
        }
    }
}

async fn generate_key(State(state): State<AppState>) -> Response {
    let key_hex = state.registry.rotate_signing_key();
    tracing::info!("symmetric signing key rotated");
    (StatusCode::OK, key_hex).into_response()
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, message).into_response()
}
