use axum::{Json, extract::State};
use std::sync::Arc;

use super::types::{ApiResponse, HealthStatus};
use super::{ApiError, AppState};

/// GET /health/check — open endpoint, exempt from the client-id check.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HealthStatus>>, ApiError> {
    let database = if state.store().ping().await.is_ok() {
        "up"
    } else {
        "down"
    };

    Ok(Json(ApiResponse::success(
        "Service is healthy",
        HealthStatus {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
            database: database.to_string(),
        },
    )))
}
