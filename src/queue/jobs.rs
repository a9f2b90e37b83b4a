//! Job model and the job-status store.
//!
//! The store is the single source of truth for job state: an in-process map
//! owned by this process, mirrored to redis as JSON so status can be read
//! across processes. Terminal states are immutable and progress only moves
//! forward.

use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::bulk::BulkSource;
use crate::types::ContentType;

const JOB_KEY_PREFIX: &str = "copyforge:job:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    AdCopy,
    SeoContent,
    BulkSeo,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::AdCopy => write!(f, "ad_copy"),
            JobKind::SeoContent => write!(f, "seo_content"),
            JobKind::BulkSeo => write!(f, "bulk_seo"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(kind: JobKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            status: JobStatus::Pending,
            progress: 0,
            message: "Queued".to_string(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Typed payloads carried alongside a queued job. Payloads stay in-process;
/// only the status record is mirrored to redis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdCopyJob {
    pub url: String,
    pub target_keywords: String,
    pub brand_name: String,
    pub selling_points: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoContentJob {
    pub url: String,
    pub target_keywords: String,
    pub brand_name: String,
    pub selling_points: String,
    pub content_type: ContentType,
    pub num_variations: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkSeoJob {
    pub source: BulkSource,
    pub default_brand_name: String,
    pub default_selling_points: String,
    pub content_type: ContentType,
    pub num_variations: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobPayload {
    AdCopy(AdCopyJob),
    SeoContent(SeoContentJob),
    BulkSeo(BulkSeoJob),
}

pub struct JobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
    redis: Option<ConnectionManager>,
    redis_healthy: AtomicBool,
    mirror_ttl: Duration,
}

impl JobStore {
    pub fn new(redis: Option<ConnectionManager>, mirror_ttl: Duration) -> Self {
        let healthy = redis.is_some();
        Self {
            jobs: RwLock::new(HashMap::new()),
            redis,
            redis_healthy: AtomicBool::new(healthy),
            mirror_ttl,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None, Duration::from_secs(86400))
    }

    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.id, job.clone());
        self.mirror(&job).await;
    }

    pub async fn get(&self, id: Uuid) -> Option<Job> {
        if let Some(job) = self.jobs.read().await.get(&id) {
            return Some(job.clone());
        }

        // Another process may own this job; fall back to the shared mirror.
        if !self.redis_healthy.load(Ordering::Relaxed) {
            return None;
        }
        let mut conn = self.redis.clone()?;
        let raw: Option<String> = match conn.get(format!("{}{}", JOB_KEY_PREFIX, id)).await {
            Ok(raw) => raw,
            Err(err) => {
                self.mark_unhealthy(&err);
                return None;
            }
        };
        raw.and_then(|raw| serde_json::from_str(&raw).ok())
    }

    pub async fn mark_running(&self, id: Uuid) {
        self.mutate(id, |job| {
            job.status = JobStatus::Running;
            job.message = "Running".to_string();
        })
        .await;
    }

    /// Progress is clamped non-decreasing and below 100; only a terminal
    /// transition may set 100.
    pub async fn set_progress(&self, id: Uuid, percent: u8, message: impl Into<String>) {
        let message = message.into();
        self.mutate(id, |job| {
            let percent = percent.min(99);
            if percent > job.progress {
                job.progress = percent;
            }
            job.message = message;
        })
        .await;
    }

    pub async fn mark_succeeded(&self, id: Uuid, result: serde_json::Value) {
        self.mutate(id, |job| {
            job.status = JobStatus::Succeeded;
            job.progress = 100;
            job.message = "Completed".to_string();
            job.result = Some(result);
        })
        .await;
    }

    pub async fn mark_failed(&self, id: Uuid, error: impl Into<String>) {
        let error = error.into();
        self.mutate(id, |job| {
            job.status = JobStatus::Failed;
            job.message = "Failed".to_string();
            job.error = Some(error);
        })
        .await;
    }

    /// Apply a mutation unless the job is unknown or already terminal.
    async fn mutate<F: FnOnce(&mut Job)>(&self, id: Uuid, f: F) -> Option<Job> {
        let updated = {
            let mut jobs = self.jobs.write().await;
            let job = jobs.get_mut(&id)?;
            if job.status.is_terminal() {
                return None;
            }
            f(job);
            job.updated_at = Utc::now();
            job.clone()
        };

        self.mirror(&updated).await;
        Some(updated)
    }

    async fn mirror(&self, job: &Job) {
        if !self.redis_healthy.load(Ordering::Relaxed) {
            return;
        }
        let Some(mut conn) = self.redis.clone() else {
            return;
        };

        let payload = match serde_json::to_string(job) {
            Ok(payload) => payload,
            Err(_) => return,
        };
        let key = format!("{}{}", JOB_KEY_PREFIX, job.id);
        let result: redis::RedisResult<()> = conn
            .set_ex(key, payload, self.mirror_ttl.as_secs().max(1))
            .await;
        if let Err(err) = result {
            self.mark_unhealthy(&err);
        }
    }

    fn mark_unhealthy(&self, err: &redis::RedisError) {
        if self.redis_healthy.swap(false, Ordering::Relaxed) {
            warn!(error = %err, "redis error, job status mirror disabled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_submitted_job_starts_pending() {
        let store = JobStore::in_memory();
        let job = Job::new(JobKind::AdCopy);
        let id = job.id;
        store.insert(job).await;

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
    }

    #[tokio::test]
    async fn test_lifecycle_reaches_100_only_at_terminal_state() {
        let store = JobStore::in_memory();
        let job = Job::new(JobKind::BulkSeo);
        let id = job.id;
        store.insert(job).await;

        store.mark_running(id).await;
        assert_eq!(store.get(id).await.unwrap().status, JobStatus::Running);

        store.set_progress(id, 100, "almost").await;
        // Not terminal yet, so progress is capped below 100.
        assert_eq!(store.get(id).await.unwrap().progress, 99);

        store.mark_succeeded(id, json!({"ok": true})).await;
        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.progress, 100);
        assert_eq!(job.result, Some(json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_progress_is_monotonically_non_decreasing() {
        let store = JobStore::in_memory();
        let job = Job::new(JobKind::SeoContent);
        let id = job.id;
        store.insert(job).await;
        store.mark_running(id).await;

        store.set_progress(id, 50, "half").await;
        store.set_progress(id, 30, "stale update").await;

        let job = store.get(id).await.unwrap();
        assert_eq!(job.progress, 50);
        // The message still reflects the latest report.
        assert_eq!(job.message, "stale update");
    }

    #[tokio::test]
    async fn test_terminal_state_is_immutable() {
        let store = JobStore::in_memory();
        let job = Job::new(JobKind::AdCopy);
        let id = job.id;
        store.insert(job).await;
        store.mark_running(id).await;
        store.mark_failed(id, "boom").await;

        store.set_progress(id, 90, "late").await;
        store.mark_succeeded(id, json!(1)).await;

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("boom"));
        assert!(job.result.is_none());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = JobStore::in_memory();
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }
}
