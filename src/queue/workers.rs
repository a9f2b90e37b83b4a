//! Worker pool executing jobs outside the request path. Each worker slot
//! processes one job at a time; submission returns immediately and clients
//! poll job status by id.

use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::bulk::{BulkOptions, BulkProcessor, ProgressSink};
use crate::fetch::PageFetch;
use crate::llm::provider::ContentGenerator;
use crate::monitoring::Metrics;
use crate::queue::jobs::{AdCopyJob, BulkSeoJob, Job, JobKind, JobPayload, JobStore, SeoContentJob};
use crate::types::{GeneratedContent, GenerationInput};

struct QueuedJob {
    id: Uuid,
    kind: JobKind,
    payload: JobPayload,
}

/// Everything a worker needs to execute job handlers. Constructed once at
/// startup and shared across worker slots.
pub struct WorkerContext {
    pub store: Arc<JobStore>,
    pub generator: Arc<dyn ContentGenerator>,
    pub fetcher: Arc<dyn PageFetch>,
    pub metrics: Arc<Metrics>,
    pub row_timeout: Duration,
}

pub struct JobQueue {
    store: Arc<JobStore>,
    metrics: Arc<Metrics>,
    tx: mpsc::UnboundedSender<QueuedJob>,
}

impl JobQueue {
    /// Spawn the worker pool and return the submission handle.
    pub fn start(ctx: Arc<WorkerContext>, worker_count: usize) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));

        for slot in 0..worker_count.max(1) {
            let rx = rx.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move {
                worker_loop(slot, rx, ctx).await;
            });
        }

        Arc::new(Self {
            store: ctx.store.clone(),
            metrics: ctx.metrics.clone(),
            tx,
        })
    }

    /// Enqueue work and return the job id immediately. Duplicate payloads
    /// become independent jobs; duplicate suppression is the cache layer's
    /// concern, not the queue's.
    pub async fn submit(&self, kind: JobKind, payload: JobPayload) -> Uuid {
        let job = Job::new(kind);
        let id = job.id;
        self.store.insert(job).await;
        self.metrics.record_job_submitted(&kind.to_string());

        if self.tx.send(QueuedJob { id, kind, payload }).is_err() {
            // Worker pool is gone; nothing will pick this up.
            error!(%id, "job channel closed, failing job at submission");
            self.store.mark_failed(id, "worker pool unavailable").await;
        }
        id
    }

    pub async fn get_status(&self, id: Uuid) -> Option<Job> {
        self.store.get(id).await
    }
}

async fn worker_loop(
    slot: usize,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<QueuedJob>>>,
    ctx: Arc<WorkerContext>,
) {
    info!(slot, "worker started");
    loop {
        let queued = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(queued) = queued else {
            info!(slot, "job channel closed, worker exiting");
            break;
        };
        execute(slot, queued, &ctx).await;
    }
}

async fn execute(slot: usize, queued: QueuedJob, ctx: &WorkerContext) {
    let QueuedJob { id, kind, payload } = queued;
    info!(slot, %id, %kind, "job started");
    let started = Instant::now();

    ctx.store.mark_running(id).await;

    let outcome = match payload {
        JobPayload::AdCopy(job) => run_ad_copy(ctx, id, job).await,
        JobPayload::SeoContent(job) => run_seo_content(ctx, id, job).await,
        JobPayload::BulkSeo(job) => run_bulk_seo(ctx, id, job).await,
    };

    match outcome {
        Ok(result) => {
            ctx.store.mark_succeeded(id, result).await;
            ctx.metrics
                .record_job_finished(&kind.to_string(), true, started.elapsed());
            info!(slot, %id, %kind, "job succeeded");
        }
        Err(message) => {
            ctx.store.mark_failed(id, message.clone()).await;
            ctx.metrics
                .record_job_finished(&kind.to_string(), false, started.elapsed());
            error!(slot, %id, %kind, error = %message, "job failed");
        }
    }
}

async fn run_ad_copy(
    ctx: &WorkerContext,
    id: Uuid,
    job: AdCopyJob,
) -> Result<serde_json::Value, String> {
    ctx.store.set_progress(id, 10, "Fetching page content").await;
    let page_text = ctx
        .fetcher
        .fetch_text(&job.url)
        .await
        .map_err(|e| format!("fetch failed: {}", e))?;

    ctx.store.set_progress(id, 50, "Generating ad copy").await;
    let input = GenerationInput {
        page_text,
        keywords: job.target_keywords,
        brand_name: job.brand_name,
        selling_points: job.selling_points,
    };
    let copy = ctx
        .generator
        .ad_copy(&input)
        .await
        .map_err(|e| e.to_string())?;

    ctx.store.set_progress(id, 90, "Finalizing").await;
    serde_json::to_value(GeneratedContent::AdCopy(copy)).map_err(|e| e.to_string())
}

async fn run_seo_content(
    ctx: &WorkerContext,
    id: Uuid,
    job: SeoContentJob,
) -> Result<serde_json::Value, String> {
    ctx.store.set_progress(id, 10, "Fetching page content").await;
    let page_text = ctx
        .fetcher
        .fetch_text(&job.url)
        .await
        .map_err(|e| format!("fetch failed: {}", e))?;

    ctx.store.set_progress(id, 50, "Generating SEO content").await;
    let input = GenerationInput {
        page_text,
        keywords: job.target_keywords,
        brand_name: job.brand_name,
        selling_points: job.selling_points,
    };
    let seo = ctx
        .generator
        .seo_content(&input, job.content_type, job.num_variations)
        .await
        .map_err(|e| e.to_string())?;

    ctx.store.set_progress(id, 90, "Finalizing").await;
    serde_json::to_value(GeneratedContent::Seo(seo)).map_err(|e| e.to_string())
}

async fn run_bulk_seo(
    ctx: &WorkerContext,
    id: Uuid,
    job: BulkSeoJob,
) -> Result<serde_json::Value, String> {
    let processor = BulkProcessor::new(
        ctx.fetcher.clone(),
        ctx.generator.clone(),
        ctx.metrics.clone(),
    );
    let options = BulkOptions {
        default_brand_name: job.default_brand_name,
        default_selling_points: job.default_selling_points,
        content_type: job.content_type,
        num_variations: job.num_variations,
        row_timeout: ctx.row_timeout,
    };
    let sink = JobProgress {
        store: ctx.store.clone(),
        id,
    };

    let result = processor
        .run(&job.source, &options, &sink)
        .await
        .map_err(|e| e.to_string())?;

    let report = crate::bulk::report::write_report(&result, options.content_type)
        .map_err(|e| e.to_string())?;

    Ok(json!({
        "total_rows": result.rows.len(),
        "failed_rows": result.failure_count(),
        "report": report,
    }))
}

/// Routes bulk-row progress into the job store.
struct JobProgress {
    store: Arc<JobStore>,
    id: Uuid,
}

#[async_trait::async_trait]
impl ProgressSink for JobProgress {
    async fn report(&self, percent: u8, message: String) {
        self.store.set_progress(self.id, percent, message).await;
    }
}
