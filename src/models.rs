//! Shared application state and HTTP request/response shapes.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::CacheService;
use crate::config::Config;
use crate::monitoring::Metrics;
use crate::queue::JobQueue;
use crate::types::ContentType;

/// Handles shared by every request handler. Constructed once in `main` and
/// cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<CacheService>,
    pub queue: Arc<JobQueue>,
    pub metrics: Arc<Metrics>,
}

fn default_variations() -> u8 {
    3
}

#[derive(Debug, Deserialize)]
pub struct AdCopyRequest {
    pub url: String,
    pub target_keywords: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub selling_points: String,
}

#[derive(Debug, Deserialize)]
pub struct SeoContentRequest {
    pub url: String,
    pub target_keywords: String,
    #[serde(default)]
    pub brand_name: String,
    #[serde(default)]
    pub selling_points: String,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default = "default_variations")]
    pub num_variations: u8,
}

#[derive(Debug, Serialize)]
pub struct JobSubmitted {
    pub success: bool,
    pub job_id: Uuid,
}

impl JobSubmitted {
    pub fn new(job_id: Uuid) -> Self {
        Self {
            success: true,
            job_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub redis: String,
}
