//! Single-URL generation endpoints. Both endpoints validate the request,
//! enqueue a job and return `202 Accepted` with the job id; clients poll
//! `/api/jobs/{id}` for the outcome.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::models::{AdCopyRequest, AppState, JobSubmitted, SeoContentRequest};
use crate::queue::{AdCopyJob, JobKind, JobPayload, SeoContentJob};
use crate::types::{AppError, AppResult};
use crate::utils::validators::{
    sanitize_input, validate_brand_name, validate_keywords, validate_url,
    MAX_BRAND_CHARS, MAX_KEYWORDS_FIELD_CHARS, MAX_SELLING_POINTS_CHARS,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ad-copy", post(submit_ad_copy))
        .route("/api/seo-content", post(submit_seo_content))
        .with_state(state)
}

async fn submit_ad_copy(
    State(state): State<AppState>,
    Json(req): Json<AdCopyRequest>,
) -> AppResult<(StatusCode, Json<JobSubmitted>)> {
    validate_url(&req.url).map_err(AppError::InvalidRequest)?;
    validate_keywords(&req.target_keywords).map_err(AppError::InvalidRequest)?;
    if !req.brand_name.trim().is_empty() {
        validate_brand_name(&req.brand_name).map_err(AppError::InvalidRequest)?;
    }

    let id = state
        .queue
        .submit(
            JobKind::AdCopy,
            JobPayload::AdCopy(AdCopyJob {
                url: req.url.trim().to_string(),
                target_keywords: sanitize_input(&req.target_keywords, MAX_KEYWORDS_FIELD_CHARS),
                brand_name: sanitize_input(&req.brand_name, MAX_BRAND_CHARS),
                selling_points: sanitize_input(&req.selling_points, MAX_SELLING_POINTS_CHARS),
            }),
        )
        .await;

    info!(%id, "ad copy job submitted");
    Ok((StatusCode::ACCEPTED, Json(JobSubmitted::new(id))))
}

async fn submit_seo_content(
    State(state): State<AppState>,
    Json(req): Json<SeoContentRequest>,
) -> AppResult<(StatusCode, Json<JobSubmitted>)> {
    validate_url(&req.url).map_err(AppError::InvalidRequest)?;
    validate_keywords(&req.target_keywords).map_err(AppError::InvalidRequest)?;
    if !req.brand_name.trim().is_empty() {
        validate_brand_name(&req.brand_name).map_err(AppError::InvalidRequest)?;
    }
    if req.num_variations == 0 || req.num_variations > 10 {
        return Err(AppError::InvalidRequest(
            "num_variations must be between 1 and 10".to_string(),
        ));
    }

    let id = state
        .queue
        .submit(
            JobKind::SeoContent,
            JobPayload::SeoContent(SeoContentJob {
                url: req.url.trim().to_string(),
                target_keywords: sanitize_input(&req.target_keywords, MAX_KEYWORDS_FIELD_CHARS),
                brand_name: sanitize_input(&req.brand_name, MAX_BRAND_CHARS),
                selling_points: sanitize_input(&req.selling_points, MAX_SELLING_POINTS_CHARS),
                content_type: req.content_type,
                num_variations: req.num_variations,
            }),
        )
        .await;

    info!(%id, content_type = %req.content_type, "seo content job submitted");
    Ok((StatusCode::ACCEPTED, Json(JobSubmitted::new(id))))
}
