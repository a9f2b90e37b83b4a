//! HTTP endpoints:
//! - `/api/ad-copy`, `/api/seo-content` - single-URL generation jobs
//! - `/api/bulk-seo` - bulk CSV upload
//! - `/api/jobs/{id}`, `/api/jobs/{id}/report` - job polling and report download
//! - `/api/health`, `/api/metrics`, `/api/cache/clear` - operations

pub mod bulk;
pub mod generate;
pub mod health;
pub mod jobs;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::models::AppState;

pub fn create_router(state: AppState) -> Router {
    info!("creating application router");

    Router::new()
        .merge(generate::router(state.clone()))
        .merge(bulk::router(state.clone()))
        .merge(jobs::router(state.clone()))
        .merge(health::router(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
