use axum::extract::State;
use serde_json::{json, Value};
use tracing::error;

use crate::errors::{AppError, AppResult};
use crate::utils::ApiResponse;
use crate::AppState;

// Health check handler
#[utoipa::path(
    get,
    path = "/api/v1/healthcheck",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health_check() -> ApiResponse<Value> {
    ApiResponse::ok(json!({ "status": "ok" }), "All healthy")
}

// Ready check handler (database reachable)
#[utoipa::path(
    get,
    path = "/api/v1/healthcheck/ready",
    tag = "health",
    responses(
        (status = 200, description = "Database reachable"),
        (status = 503, description = "Database unavailable")
    )
)]
pub async fn ready_check(State(state): State<AppState>) -> AppResult<ApiResponse<Value>> {
    let health = state.database.health_check().await.map_err(|e| {
        error!("Database health check failed: {}", e);
        AppError::service_unavailable("Database unavailable", vec![e.to_string()])
    })?;

    if !health.connected {
        error!("Database not connected: {}", health.status);
        let errors = std::iter::once(health.status).chain(health.details).collect();
        return Err(AppError::service_unavailable("Database unavailable", errors));
    }

    Ok(ApiResponse::ok(
        json!({
            "status": "ready",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION"),
            "database": {
                "status": health.status,
                "type": health.database_type,
                "responseTimeMs": health.response_time_ms,
            },
            "media": state.media.provider(),
        }),
        "Service ready",
    ))
}
