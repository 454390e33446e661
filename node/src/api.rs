//! # HTTP API
//!
//! Builds the axum router for the token endpoints. Handlers share state
//! through axum's `State` extractor and hand key-store and RSA work to
//! tokio's blocking pool.
//!
//! ## Endpoints
//!
//! | Method | Path            | Description                                  |
//! |--------|-----------------|----------------------------------------------|
//! | GET    | `/health`       | Liveness probe                               |
//! | GET    | `/publicKey`    | Base58 public key of the signing pair        |
//! | POST   | `/createReqMsg` | Claim JSON in, signed request message out    |
//! | POST   | `/verifyReqMsg` | Request message in, verification report out  |
//!
//! Request bodies are read as raw text whatever the content type, so a claim
//! is hashed exactly as the client wrote it after JSON re-serialization.
//!
//! Status codes: `400` for input that cannot be checked (bad JSON, malformed
//! token, bad Base64) and for a completed verification that did not match;
//! `500` when the key store fails.

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use claimseal_protocol::token::{RequestMessage, TokenError, TokenService};

use crate::metrics::{SharedMetrics, OUTCOME_MISMATCH, OUTCOME_REJECTED, OUTCOME_VALID};

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared state available to all request handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Reported version string.
    pub version: String,
    /// Issuance and verification bound to the node's key store.
    pub tokens: TokenService,
    /// Prometheus handles.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Whether both key files are present.
    pub keys_present: bool,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /publicKey`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    /// Base58 of the X.509 DER public key, as stored in `public.pem`.
    pub public_key: String,
    pub algorithm: String,
    pub key_size_bits: usize,
}

/// Generic error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the API router with CORS and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/publicKey", get(public_key_handler))
        .route("/createReqMsg", post(create_request_handler))
        .route("/verifyReqMsg", post(verify_request_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builds the router for the metrics listener.
pub fn create_metrics_router(metrics: SharedMetrics) -> Router {
    Router::new()
        .route("/metrics", get(crate::metrics::metrics_handler))
        .with_state(metrics)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        keys_present: state.tokens.key_store().exists(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /publicKey`
async fn public_key_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let tokens = state.tokens.clone();
    let result = blocking(move || {
        let pair = tokens.key_pair()?;
        Ok(PublicKeyResponse {
            public_key: pair.public_key_base58()?,
            algorithm: pair.algorithm().to_string(),
            key_size_bits: pair.key_size_bits(),
        })
    })
    .await;

    let response = match result {
        Ok(Ok(body)) => (StatusCode::OK, Json(body)).into_response(),
        Ok(Err(e)) => token_error_response(e),
        Err(response) => response,
    };
    state.metrics.observe_latency("/publicKey", started);
    response
}

/// `POST /createReqMsg`: body is the claim JSON; responds with the
/// pretty-printed request message.
async fn create_request_handler(State(state): State<AppState>, body: String) -> Response {
    let started = Instant::now();
    let tokens = state.tokens.clone();
    let result = blocking(move || {
        tokens
            .issue_request(&body)
            .and_then(|request| request.to_json_pretty())
    })
    .await;

    let response = match result {
        Ok(Ok(json)) => {
            state.metrics.tokens_issued_total.inc();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                json,
            )
                .into_response()
        }
        Ok(Err(e)) => token_error_response(e),
        Err(response) => response,
    };
    state.metrics.observe_latency("/createReqMsg", started);
    response
}

/// `POST /verifyReqMsg`: body is a request message; responds with a
/// [`VerificationReport`](claimseal_protocol::token::VerificationReport).
async fn verify_request_handler(State(state): State<AppState>, body: String) -> Response {
    let started = Instant::now();
    let tokens = state.tokens.clone();
    let result = blocking(move || {
        RequestMessage::from_json(&body).and_then(|request| tokens.verify_request(&request))
    })
    .await;

    let response = match result {
        Ok(Ok(report)) => {
            let (status, outcome) = if report.verified {
                (StatusCode::OK, OUTCOME_VALID)
            } else {
                (StatusCode::BAD_REQUEST, OUTCOME_MISMATCH)
            };
            state.metrics.record_verification(outcome);
            (status, Json(report)).into_response()
        }
        Ok(Err(e)) => {
            if e.is_rejected_input() {
                state.metrics.record_verification(OUTCOME_REJECTED);
            }
            token_error_response(e)
        }
        Err(response) => response,
    };
    state.metrics.observe_latency("/verifyReqMsg", started);
    response
}

/// Runs key-store and RSA work on the blocking pool. Loading reads both key
/// files and a missing pair means generating one, which takes seconds.
async fn blocking<T, F>(work: F) -> Result<Result<T, TokenError>, Response>
where
    F: FnOnce() -> Result<T, TokenError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!(error = %e, "blocking task failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "internal error".to_string(),
            }),
        )
            .into_response()
    })
}

/// Maps a [`TokenError`] to `400` (caller's fault) or `500` (ours).
fn token_error_response(e: TokenError) -> Response {
    let status = if e.is_rejected_input() {
        tracing::warn!(error = %e, "rejected request");
        StatusCode::BAD_REQUEST
    } else {
        tracing::error!(error = %e, "request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}
