use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET / - Service name and version
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health - Opens a connection and pings the store
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let result = match state.db.acquire().await {
        Ok(mut conn) => {
            let ping = conn.ping().await;
            conn.close().await;
            ping
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
