//! Job status polling.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::models::AppState;
use crate::queue::Job;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/jobs/{id}", get(job_status))
        .with_state(state)
}

async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Job>> {
    let job = state
        .queue
        .get_status(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("job {} not found", id)))?;
    Ok(Json(job))
}
