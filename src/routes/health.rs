//! Operational endpoints: health, metrics and cache administration.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use crate::models::{AppState, HealthResponse};
use crate::monitoring::MetricsSnapshot;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/metrics", get(metrics))
        .route("/api/cache/clear", post(clear_cache))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let redis = if !state.config.redis.enabled {
        "disabled"
    } else if state.cache.health_check().await {
        "connected"
    } else {
        "unavailable"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        redis: redis.to_string(),
    })
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn clear_cache(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.cache.clear_all().await;
    info!("cache cleared by request");
    Json(json!({"success": true, "message": "Cache cleared"}))
}
