//! Bulk CSV endpoints: multipart upload of a row file and retrieval of the
//! finished report as a CSV download.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use crate::bulk::BulkSource;
use crate::models::{AppState, JobSubmitted};
use crate::queue::{BulkSeoJob, JobKind, JobPayload, JobStatus};
use crate::types::{AppError, AppResult, ContentType};
use crate::utils::validators::{sanitize_input, MAX_BRAND_CHARS, MAX_SELLING_POINTS_CHARS};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/bulk-seo", post(submit_bulk))
        .route("/api/jobs/{id}/report", get(download_report))
        .with_state(state)
}

async fn submit_bulk(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<JobSubmitted>)> {
    let mut csv_content: Option<String> = None;
    let mut urls_text = String::new();
    let mut brand_name = String::new();
    let mut selling_points = String::new();
    let mut content_type = ContentType::default();
    let mut num_variations: u8 = 3;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("unreadable field '{}': {}", name, e)))?;

        match name.as_str() {
            "file" => csv_content = Some(value),
            "urls" => urls_text = value,
            "brand_name" => brand_name = sanitize_input(&value, MAX_BRAND_CHARS),
            "selling_points" => {
                selling_points = sanitize_input(&value, MAX_SELLING_POINTS_CHARS)
            }
            "content_type" => {
                content_type = ContentType::from_str(&value)
                    .map_err(|e| AppError::InvalidRequest(e.to_string()))?
            }
            "num_variations" => {
                num_variations = value.trim().parse().map_err(|_| {
                    AppError::InvalidRequest("num_variations must be a number".to_string())
                })?
            }
            _ => {}
        }
    }

    // A CSV upload wins over a pasted URL list when both are present.
    let source = match csv_content {
        Some(csv) if !csv.trim().is_empty() => BulkSource::Csv(csv),
        _ if !urls_text.trim().is_empty() => BulkSource::Urls(urls_text),
        _ => {
            return Err(AppError::InvalidRequest(
                "upload a CSV 'file' or provide a 'urls' list".to_string(),
            ))
        }
    };
    if num_variations == 0 || num_variations > 10 {
        return Err(AppError::InvalidRequest(
            "num_variations must be between 1 and 10".to_string(),
        ));
    }

    let id = state
        .queue
        .submit(
            JobKind::BulkSeo,
            JobPayload::BulkSeo(BulkSeoJob {
                source,
                default_brand_name: brand_name,
                default_selling_points: selling_points,
                content_type,
                num_variations,
            }),
        )
        .await;

    info!(%id, %content_type, "bulk seo job submitted");
    Ok((StatusCode::ACCEPTED, Json(JobSubmitted::new(id))))
}

async fn download_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let job = state
        .queue
        .get_status(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("job {} not found", id)))?;

    match job.status {
        JobStatus::Succeeded => {}
        JobStatus::Failed => {
            return Err(AppError::Conflict(format!(
                "job {} failed: {}",
                id,
                job.error.unwrap_or_else(|| "unknown error".to_string())
            )))
        }
        _ => {
            return Err(AppError::Conflict(format!(
                "job {} is still in progress",
                id
            )))
        }
    }

    let report = job
        .result
        .as_ref()
        .and_then(|result| result.get("report"))
        .and_then(|report| report.as_str())
        .ok_or_else(|| AppError::NotFound(format!("job {} has no report", id)))?
        .to_string();

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"seo_content_{}.csv\"", id),
        ),
    ];
    Ok((headers, report).into_response())
}
