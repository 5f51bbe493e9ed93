use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "imagery-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready once the data directory can hold the daily cache.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    if !state.storage.is_usable().await {
        tracing::warn!("Data directory unusable, reporting not ready");
        return Err(AppError::ServiceUnavailable);
    }
    Ok(StatusCode::OK)
}
