//! Retrying generation client. Wraps a [`GenerationBackend`] with the retry
//! policy, prompt construction and structured-payload extraction; every call
//! records its outcome, duration and token usage to the metrics sink.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;
use tracing::warn;

use crate::llm::prompts;
use crate::llm::provider::{Completion, CompletionRequest, ContentGenerator, GenerationBackend};
use crate::monitoring::Metrics;
use crate::types::{AdCopy, ContentType, GenerationError, GenerationInput, SeoContent};
use crate::utils::retry::RetryPolicy;

pub struct Generator {
    backend: Arc<dyn GenerationBackend>,
    retry: RetryPolicy,
    metrics: Arc<Metrics>,
    max_page_chars: usize,
}

impl Generator {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        retry: RetryPolicy,
        metrics: Arc<Metrics>,
        max_page_chars: usize,
    ) -> Self {
        Self {
            backend,
            retry,
            metrics,
            max_page_chars,
        }
    }

    /// Call the backend, retrying transient failures up to the policy's
    /// attempt budget with capped exponential backoff.
    async fn complete_with_retry(
        &self,
        request: &CompletionRequest,
    ) -> Result<Completion, GenerationError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.backend.complete(request).await {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient generation failure, retrying"
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn run_operation<T>(
        &self,
        operation: &'static str,
        request: CompletionRequest,
        parse: impl FnOnce(&str) -> Result<T, GenerationError>,
    ) -> Result<T, GenerationError> {
        let started = Instant::now();
        let outcome = self.complete_with_retry(&request).await;

        match outcome {
            Ok(completion) => {
                let tokens = completion.usage.map(|u| u.total_tokens);
                match parse(&completion.content) {
                    Ok(parsed) => {
                        self.metrics
                            .record_generation(operation, true, started.elapsed(), tokens);
                        Ok(parsed)
                    }
                    Err(err) => {
                        // Parse failures are distinguished in logs but are
                        // terminal for the call, like any other failure.
                        warn!(operation, error = %err, "completion contained no usable payload");
                        self.metrics
                            .record_generation(operation, false, started.elapsed(), tokens);
                        Err(err)
                    }
                }
            }
            Err(err) => {
                self.metrics
                    .record_generation(operation, false, started.elapsed(), None);
                Err(err)
            }
        }
    }
}

/// Slice out the first `{...}` JSON object embedded in free-form text.
fn extract_json_object(content: &str) -> Result<&str, GenerationError> {
    let start = content
        .find('{')
        .ok_or_else(|| GenerationError::Parse("no JSON object in completion".to_string()))?;
    let end = content
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| GenerationError::Parse("unterminated JSON object".to_string()))?;
    Ok(&content[start..=end])
}

fn parse_ad_copy(content: &str) -> Result<AdCopy, GenerationError> {
    let json = extract_json_object(content)?;
    serde_json::from_str(json)
        .map_err(|e| GenerationError::Parse(format!("ad copy payload: {}", e)))
}

fn string_array(value: &Value, field: &str) -> Vec<String> {
    value[field]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse and shape the SEO payload by the requested content type: a
/// titles-only request must yield titles (descriptions dropped), and
/// symmetrically for descriptions.
fn parse_seo_content(
    content: &str,
    content_type: ContentType,
) -> Result<SeoContent, GenerationError> {
    let json = extract_json_object(content)?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| GenerationError::Parse(format!("seo payload: {}", e)))?;

    let titles = string_array(&value, "titles");
    let descriptions = string_array(&value, "descriptions");

    match content_type {
        ContentType::Titles if titles.is_empty() => {
            Err(GenerationError::Parse("payload missing titles".to_string()))
        }
        ContentType::Descriptions if descriptions.is_empty() => Err(GenerationError::Parse(
            "payload missing descriptions".to_string(),
        )),
        ContentType::Both if titles.is_empty() && descriptions.is_empty() => Err(
            GenerationError::Parse("payload missing titles and descriptions".to_string()),
        ),
        ContentType::Titles => Ok(SeoContent {
            titles,
            descriptions: Vec::new(),
        }),
        ContentType::Descriptions => Ok(SeoContent {
            titles: Vec::new(),
            descriptions,
        }),
        ContentType::Both => Ok(SeoContent {
            titles,
            descriptions,
        }),
    }
}

#[async_trait]
impl ContentGenerator for Generator {
    async fn ad_copy(&self, input: &GenerationInput) -> Result<AdCopy, GenerationError> {
        let request = CompletionRequest {
            system: prompts::AD_COPY_SYSTEM.to_string(),
            prompt: prompts::build_ad_copy_prompt(input, self.max_page_chars),
            temperature: prompts::AD_COPY_TEMPERATURE,
        };
        self.run_operation("ad_copy", request, parse_ad_copy).await
    }

    async fn seo_content(
        &self,
        input: &GenerationInput,
        content_type: ContentType,
        variations: u8,
    ) -> Result<SeoContent, GenerationError> {
        let request = CompletionRequest {
            system: prompts::SEO_SYSTEM.to_string(),
            prompt: prompts::build_seo_prompt(input, content_type, variations, self.max_page_chars),
            temperature: prompts::SEO_TEMPERATURE,
        };
        self.run_operation("seo_content", request, |content| {
            parse_seo_content(content, content_type)
        })
        .await
    }
}
