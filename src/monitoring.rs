//! Counters and timers for the pipeline: cache hits/misses, generation
//! call outcomes, and job lifecycle. Durations are emitted as structured
//! tracing events; counters are exposed as a JSON snapshot.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct Metrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    generation_success: AtomicU64,
    generation_failure: AtomicU64,
    tokens_consumed: AtomicU64,
    jobs_submitted: AtomicU64,
    jobs_succeeded: AtomicU64,
    jobs_failed: AtomicU64,
    bulk_rows_processed: AtomicU64,
    bulk_rows_failed: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub generation_success: u64,
    pub generation_failure: u64,
    pub tokens_consumed: u64,
    pub jobs_submitted: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub bulk_rows_processed: u64,
    pub bulk_rows_failed: u64,
}

impl Metrics {
    pub fn record_cache_hit(&self, operation: &str) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        debug!(operation, "cache hit");
    }

    pub fn record_cache_miss(&self, operation: &str) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        debug!(operation, "cache miss");
    }

    /// Required side effect of every generation call: outcome, duration and
    /// token consumption when the provider reports it.
    pub fn record_generation(
        &self,
        operation: &str,
        success: bool,
        duration: Duration,
        tokens: Option<u32>,
    ) {
        if success {
            self.generation_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.generation_failure.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(tokens) = tokens {
            self.tokens_consumed.fetch_add(tokens as u64, Ordering::Relaxed);
        }
        info!(
            operation,
            success,
            duration_ms = duration.as_millis() as u64,
            tokens = tokens.unwrap_or(0),
            "generation call finished"
        );
    }

    pub fn record_job_submitted(&self, kind: &str) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
        info!(kind, "job submitted");
    }

    pub fn record_job_finished(&self, kind: &str, success: bool, duration: Duration) {
        if success {
            self.jobs_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.jobs_failed.fetch_add(1, Ordering::Relaxed);
        }
        info!(
            kind,
            success,
            duration_ms = duration.as_millis() as u64,
            "job finished"
        );
    }

    pub fn record_bulk_row(&self, success: bool) {
        self.bulk_rows_processed.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.bulk_rows_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            generation_success: self.generation_success.load(Ordering::Relaxed),
            generation_failure: self.generation_failure.load(Ordering::Relaxed),
            tokens_consumed: self.tokens_consumed.load(Ordering::Relaxed),
            jobs_submitted: self.jobs_submitted.load(Ordering::Relaxed),
            jobs_succeeded: self.jobs_succeeded.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            bulk_rows_processed: self.bulk_rows_processed.load(Ordering::Relaxed),
            bulk_rows_failed: self.bulk_rows_failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::default();
        metrics.record_cache_hit("ad_copy");
        metrics.record_cache_miss("ad_copy");
        metrics.record_cache_miss("seo_content");
        metrics.record_generation("seo_content", true, Duration::from_millis(5), Some(42));
        metrics.record_generation("seo_content", false, Duration::from_millis(5), None);
        metrics.record_bulk_row(true);
        metrics.record_bulk_row(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.cache_misses, 2);
        assert_eq!(snapshot.generation_success, 1);
        assert_eq!(snapshot.generation_failure, 1);
        assert_eq!(snapshot.tokens_consumed, 42);
        assert_eq!(snapshot.bulk_rows_processed, 2);
        assert_eq!(snapshot.bulk_rows_failed, 1);
    }
}
