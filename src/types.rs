// Shared type definitions and the error taxonomy

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Which SEO fields a request wants generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Titles,
    Descriptions,
    #[default]
    Both,
}

impl ContentType {
    pub fn wants_titles(&self) -> bool {
        matches!(self, ContentType::Titles | ContentType::Both)
    }

    pub fn wants_descriptions(&self) -> bool {
        matches!(self, ContentType::Descriptions | ContentType::Both)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Titles => write!(f, "titles"),
            ContentType::Descriptions => write!(f, "descriptions"),
            ContentType::Both => write!(f, "both"),
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "titles" => Ok(ContentType::Titles),
            "descriptions" => Ok(ContentType::Descriptions),
            "both" => Ok(ContentType::Both),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// Normalized inputs for one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationInput {
    pub page_text: String,
    pub keywords: String,
    pub brand_name: String,
    pub selling_points: String,
}

/// Google Ads copy fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdCopy {
    pub headline: String,
    pub description1: String,
    pub description2: String,
    pub call_to_action: String,
}

/// SEO metadata variations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoContent {
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
}

/// Tagged result union: the two result shapes are distinct variants rather
/// than a loose map inspected by key presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratedContent {
    AdCopy(AdCopy),
    Seo(SeoContent),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Failures of the generation backend and the parsing around it.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation request timed out")]
    Timeout,

    #[error("rate limited by provider")]
    RateLimited,

    #[error("network error: {0}")]
    Network(String),

    #[error("provider error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("no well-formed payload in completion: {0}")]
    Parse(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl GenerationError {
    /// Transient failures are retried; everything else is terminal.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Timeout
            | GenerationError::RateLimited
            | GenerationError::Network(_) => true,
            GenerationError::Api { status, .. } => *status >= 500,
            GenerationError::Parse(_) | GenerationError::InvalidInput(_) => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Fetch(_) | AppError::Generation(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parsing() {
        assert_eq!("titles".parse::<ContentType>().unwrap(), ContentType::Titles);
        assert_eq!("Both".parse::<ContentType>().unwrap(), ContentType::Both);
        assert_eq!(
            " descriptions ".parse::<ContentType>().unwrap(),
            ContentType::Descriptions
        );
        assert!("headlines".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_transient_classification() {
        assert!(GenerationError::Timeout.is_transient());
        assert!(GenerationError::RateLimited.is_transient());
        assert!(GenerationError::Network("reset".into()).is_transient());
        assert!(GenerationError::Api { status: 503, message: "overloaded".into() }.is_transient());
        assert!(!GenerationError::Api { status: 400, message: "bad prompt".into() }.is_transient());
        assert!(!GenerationError::Parse("no json".into()).is_transient());
    }

    #[test]
    fn test_generated_content_is_tagged() {
        let content = GeneratedContent::Seo(SeoContent {
            titles: vec!["T1".into()],
            descriptions: vec![],
        });
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["kind"], "seo");
        assert_eq!(value["titles"][0], "T1");
    }
}
