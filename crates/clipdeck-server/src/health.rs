use axum::Json;
use clipdeck_core::OkStatus;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: OkStatus,
    message: &'static str,
}

/// Health check handler
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: OkStatus::new(),
        message: "clipdeck API is running",
    })
}
