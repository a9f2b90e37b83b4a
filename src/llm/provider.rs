use async_trait::async_trait;

use crate::types::{
    AdCopy, ContentType, GenerationError, GenerationInput, SeoContent, TokenUsage,
};

/// One completion request to the underlying model API.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
}

/// Raw completion text plus token accounting when the provider reports it.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

/// Low-level transport to a model provider. Implementations map provider
/// failures onto the shared [`GenerationError`] taxonomy so the retry layer
/// can classify them.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, GenerationError>;
}

/// High-level generation capability. The plain [`super::Generator`] talks to
/// a backend with retries; [`crate::cache::CachedGenerator`] wraps any
/// implementation with the duplicate-suppression cache.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn ad_copy(&self, input: &GenerationInput) -> Result<AdCopy, GenerationError>;

    async fn seo_content(
        &self,
        input: &GenerationInput,
        content_type: ContentType,
        variations: u8,
    ) -> Result<SeoContent, GenerationError>;
}
