// OpenAI chat-completions adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OpenAiConfig;
use crate::llm::provider::{Completion, CompletionRequest, GenerationBackend};
use crate::types::{GenerationError, TokenUsage};

const REQUEST_TIMEOUT_SECS: u64 = 60;

pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiBackend {
    pub fn new(config: &OpenAiConfig) -> Self {
        Self::with_base_url(config, &config.base_url)
    }

    /// Point the adapter at a different endpoint (tests, proxies).
    pub fn with_base_url(config: &OpenAiConfig, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn map_transport_error(err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| GenerationError::Api {
            status: status.as_u16(),
            message: format!("undecodable response body: {}", e),
        })?;

        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| GenerationError::Api {
                status: status.as_u16(),
                message: "response contained no choices".to_string(),
            })?;

        let usage = parsed.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(Completion { content, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> OpenAiConfig {
        OpenAiConfig {
            api_key: "test-key".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 256,
            base_url: base_url.to_string(),
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "You are an expert copywriter.".to_string(),
            prompt: "Write something.".to_string(),
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn test_successful_completion_with_usage() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(
                r#"{
                    "choices": [{"message": {"role": "assistant", "content": "hello"}}],
                    "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
                }"#,
            )
            .create_async()
            .await;

        let backend = OpenAiBackend::new(&test_config(&server.url()));
        let completion = backend.complete(&request()).await.unwrap();

        assert_eq!(completion.content, "hello");
        assert_eq!(completion.usage.unwrap().total_tokens, 15);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_transient_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error": {"message": "rate limit"}}"#)
            .create_async()
            .await;

        let backend = OpenAiBackend::new(&test_config(&server.url()));
        let err = backend.complete(&request()).await.unwrap_err();

        assert!(matches!(err, GenerationError::RateLimited));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_is_transient_client_error_is_not() {
        let mut server = mockito::Server::new_async().await;
        let mock_500 = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body(r#"{"error": {"message": "boom"}}"#)
            .expect(1)
            .create_async()
            .await;

        let backend = OpenAiBackend::new(&test_config(&server.url()));
        let err = backend.complete(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Api { status: 500, .. }));
        assert!(err.is_transient());
        mock_500.assert_async().await;

        server
            .mock("POST", "/chat/completions")
            .with_status(400)
            .with_body(r#"{"error": {"message": "bad request"}}"#)
            .create_async()
            .await;

        let err = backend.complete(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Api { status: 400, .. }));
        assert!(!err.is_transient());
    }
}
