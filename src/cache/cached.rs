//! Duplicate suppression around the expensive generation calls: an explicit
//! wrap-and-delegate layer that any [`ContentGenerator`] can sit behind.
//!
//! A miss performs exactly one cache write. Two concurrent misses for the
//! same key may both invoke the inner generator; the result is deterministic
//! per key, so last-write-wins is acceptable and no in-flight lock is held.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::keys::{cache_key, normalize_keywords};
use crate::cache::CacheService;
use crate::llm::provider::ContentGenerator;
use crate::monitoring::Metrics;
use crate::types::{AdCopy, ContentType, GenerationError, GenerationInput, SeoContent};

pub struct CachedGenerator {
    inner: Arc<dyn ContentGenerator>,
    cache: Arc<CacheService>,
    metrics: Arc<Metrics>,
    ttl: Duration,
}

impl CachedGenerator {
    pub fn new(
        inner: Arc<dyn ContentGenerator>,
        cache: Arc<CacheService>,
        metrics: Arc<Metrics>,
        ttl: Duration,
    ) -> Self {
        Self {
            inner,
            cache,
            metrics,
            ttl,
        }
    }

    fn ad_copy_key(input: &GenerationInput) -> String {
        cache_key(
            "ad_copy",
            &[
                &input.page_text,
                &normalize_keywords(&input.keywords),
                &input.brand_name,
                &input.selling_points,
            ],
        )
    }

    fn seo_key(input: &GenerationInput, content_type: ContentType, variations: u8) -> String {
        cache_key(
            "seo_content",
            &[
                &input.page_text,
                &normalize_keywords(&input.keywords),
                &input.brand_name,
                &input.selling_points,
                &content_type.to_string(),
                &variations.to_string(),
            ],
        )
    }
}

#[async_trait]
impl ContentGenerator for CachedGenerator {
    async fn ad_copy(&self, input: &GenerationInput) -> Result<AdCopy, GenerationError> {
        let key = Self::ad_copy_key(input);

        if let Some(value) = self.cache.get(&key).await {
            if let Ok(hit) = serde_json::from_value::<AdCopy>(value) {
                self.metrics.record_cache_hit("ad_copy");
                return Ok(hit);
            }
        }
        self.metrics.record_cache_miss("ad_copy");

        let result = self.inner.ad_copy(input).await?;
        if let Ok(value) = serde_json::to_value(&result) {
            self.cache.set(&key, &value, self.ttl).await;
        }
        Ok(result)
    }

    async fn seo_content(
        &self,
        input: &GenerationInput,
        content_type: ContentType,
        variations: u8,
    ) -> Result<SeoContent, GenerationError> {
        let key = Self::seo_key(input, content_type, variations);

        if let Some(value) = self.cache.get(&key).await {
            if let Ok(hit) = serde_json::from_value::<SeoContent>(value) {
                self.metrics.record_cache_hit("seo_content");
                return Ok(hit);
            }
        }
        self.metrics.record_cache_miss("seo_content");

        let result = self
            .inner
            .seo_content(input, content_type, variations)
            .await?;
        if let Ok(value) = serde_json::to_value(&result) {
            self.cache.set(&key, &value, self.ttl).await;
        }
        Ok(result)
    }
}
