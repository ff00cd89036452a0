//! Health check endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Current status of the service
    pub status: String,
    /// Version of the service
    pub version: String,
}

impl HealthResponse {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::new("healthy"))
}

/// Readiness check endpoint (queries the store)
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = HealthResponse),
        (status = 503, description = "Store unavailable", body = HealthResponse)
    )
)]
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.services.loans.summary().await {
        Ok(_) => (StatusCode::OK, Json(HealthResponse::new("ready"))),
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse::new("unavailable")))
        }
    }
}
