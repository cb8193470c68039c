//! Driver HTTP Routes
//!
//! - `POST /create`: provision a build's stores
//! - `POST /promote`: schedule a promotion, `202` once scheduled
//! - `POST /collect`: classify without promoting
//! - `GET /health`, `GET /metrics`

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::driver::{Driver, DriverError, ErrorKind};
use crate::model::{CollectRequest, CreateRequest, PromoteRequest};

/// Error body of every failing route
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_promotions: usize,
    pub shutting_down: bool,
}

/// HTTP status of a failed operation
pub fn status_of(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Stopping => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Setup
        | ErrorKind::Tracking
        | ErrorKind::Transport
        | ErrorKind::RollbackCompound => StatusCode::BAD_GATEWAY,
        ErrorKind::Classification | ErrorKind::PromotionValidation => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(error: DriverError) -> Response {
    let status = status_of(error.kind());
    if status.is_server_error() {
        tracing::error!(code = error.code(), error = %error, "Request failed");
    }
    let body = ErrorResponse {
        error: error.to_string(),
        code: error.code().to_string(),
    };
    (status, Json(body)).into_response()
}

/// Create driver routes
pub fn driver_routes(driver: Arc<Driver>) -> Router {
    Router::new()
        .route("/create", post(create_handler))
        .route("/promote", post(promote_handler))
        .route("/collect", post(collect_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(driver)
}

async fn create_handler(
    State(driver): State<Arc<Driver>>,
    Json(request): Json<CreateRequest>,
) -> Response {
    match driver.create(&request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn promote_handler(
    State(driver): State<Arc<Driver>>,
    Json(request): Json<PromoteRequest>,
) -> Response {
    match driver.promote(request) {
        Ok(_) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_response(e),
    }
}

async fn collect_handler(
    State(driver): State<Arc<Driver>>,
    Json(request): Json<CollectRequest>,
) -> Response {
    match driver.collect_repo_manager_result(&request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn health_handler(State(driver): State<Arc<Driver>>) -> impl IntoResponse {
    let lifecycle = driver.lifecycle();
    let shutting_down = lifecycle.is_shutting_down();
    let response = HealthResponse {
        status: if shutting_down { "stopping" } else { "ok" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_promotions: lifecycle.active_promotions(),
        shutting_down,
    };

    (StatusCode::OK, Json(response))
}

async fn metrics_handler(State(driver): State<Arc<Driver>>) -> impl IntoResponse {
    (StatusCode::OK, Json(driver.metrics().snapshot()))
}
