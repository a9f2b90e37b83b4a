//! Page fetching and text extraction. The bulk processor and single-item
//! jobs depend on the [`PageFetch`] trait so tests can substitute stubs.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

use crate::config::FetchConfig;

const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; CopyforgeBot/1.0; +https://github.com/copyforge)";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("no text content extracted")]
    NoContent,
}

#[async_trait]
pub trait PageFetch: Send + Sync {
    /// Fetch a URL and return its extracted, length-capped text content.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpPageFetcher {
    client: Client,
    max_chars: usize,
}

impl HttpPageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            max_chars: config.max_page_chars,
        })
    }
}

#[async_trait]
impl PageFetch for HttpPageFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let text = extract_text(&html, self.max_chars);
        if text.is_empty() {
            return Err(FetchError::NoContent);
        }

        debug!(url, chars = text.len(), "page text extracted");
        Ok(text)
    }
}

/// Extract readable text from HTML. Tries content-bearing containers first
/// and falls back to the whole body; whitespace is collapsed and the result
/// capped at `max_chars` on a word boundary.
pub fn extract_text(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let content_selectors = ["article", "main", "[role='main']", "#content", ".content"];
    for selector_str in content_selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
                if text.chars().count() > 100 {
                    return truncate_words(&text, max_chars);
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("body") {
        if let Some(body) = document.select(&selector).next() {
            let text = clean_text(&body.text().collect::<Vec<_>>().join(" "));
            return truncate_words(&text, max_chars);
        }
    }

    String::new()
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_words(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    match cut.rfind(' ') {
        Some(last_space) => cut[..last_space].to_string(),
        None => cut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_article_over_chrome() {
        let html = r#"
            <html><body>
                <nav>Navigation that should not leak into the extract</nav>
                <article>
                    <h1>Trail Shoes</h1>
                    <p>Premium running shoes built for every terrain, with cushioned
                    soles and waterproof uppers designed for long-distance comfort.</p>
                </article>
                <footer>Footer links</footer>
            </body></html>
        "#;
        let text = extract_text(html, 2000);
        assert!(text.contains("Trail Shoes"));
        assert!(text.contains("waterproof uppers"));
        assert!(!text.contains("Navigation"));
    }

    #[test]
    fn test_falls_back_to_body() {
        let html = "<html><body><p>Short page.</p></body></html>";
        assert_eq!(extract_text(html, 2000), "Short page.");
    }

    #[test]
    fn test_collapses_whitespace() {
        let html = "<html><body><p>a\n\n   b\t c</p></body></html>";
        assert_eq!(extract_text(html, 2000), "a b c");
    }

    #[test]
    fn test_truncates_on_word_boundary() {
        let html = format!(
            "<html><body><p>{}</p></body></html>",
            "word ".repeat(1000)
        );
        let text = extract_text(&html, 103);
        assert!(text.chars().count() <= 103);
        assert!(text.ends_with("word"));
    }

    #[test]
    fn test_empty_document_yields_empty_string() {
        assert_eq!(extract_text("", 2000), "");
    }
}
