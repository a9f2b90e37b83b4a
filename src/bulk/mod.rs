//! Bulk processor: drives many (url, keywords, brand) rows through
//! fetch → generate → collect. Rows come from a CSV upload or a pasted
//! URL list; in the latter case keywords are extracted from the fetched
//! page text. Rows are processed sequentially in input order; a row's
//! failure is recorded inline and never aborts the batch.

pub mod keywords;
pub mod report;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::fetch::PageFetch;
use crate::llm::provider::ContentGenerator;
use crate::monitoring::Metrics;
use crate::types::{AppError, AppResult, ContentType, GenerationInput, SeoContent};

/// Receives per-row progress updates (percent, human-readable message).
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, percent: u8, message: String);
}

/// No-op sink for callers that do not track progress.
pub struct NoProgress;

#[async_trait]
impl ProgressSink for NoProgress {
    async fn report(&self, _percent: u8, _message: String) {}
}

/// Input for one bulk run: a CSV document with `url`/`keywords` columns,
/// or a newline-separated URL list with keywords derived per page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BulkSource {
    Csv(String),
    Urls(String),
}

#[derive(Debug, Clone)]
pub struct BulkOptions {
    pub default_brand_name: String,
    pub default_selling_points: String,
    pub content_type: ContentType,
    pub num_variations: u8,
    pub row_timeout: Duration,
}

/// One parsed input row before processing.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    pub url: String,
    pub keywords: String,
    pub brand_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Success { content: SeoContent },
    Failure { error: String },
}

/// One input row plus its recorded outcome; immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkRow {
    pub url: String,
    pub keywords: String,
    pub brand_name: String,
    pub outcome: RowOutcome,
}

/// Ordered outcomes for a whole bulk run; order matches the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkResult {
    pub rows: Vec<BulkRow>,
}

impl BulkResult {
    pub fn failure_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| matches!(row.outcome, RowOutcome::Failure { .. }))
            .count()
    }
}

pub struct BulkProcessor {
    fetcher: Arc<dyn PageFetch>,
    generator: Arc<dyn ContentGenerator>,
    metrics: Arc<Metrics>,
}

impl BulkProcessor {
    pub fn new(
        fetcher: Arc<dyn PageFetch>,
        generator: Arc<dyn ContentGenerator>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            fetcher,
            generator,
            metrics,
        }
    }

    /// Parse CSV content into input rows. Requires `url` and `keywords`
    /// columns; `brand_name` is optional and falls back to the job default.
    pub fn parse_rows(csv_content: &str, default_brand_name: &str) -> AppResult<Vec<InputRow>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(csv_content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::InvalidRequest(format!("unreadable CSV header: {}", e)))?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
        };
        let url_col = column("url")
            .ok_or_else(|| AppError::InvalidRequest("CSV is missing a 'url' column".to_string()))?;
        let keywords_col = column("keywords").ok_or_else(|| {
            AppError::InvalidRequest("CSV is missing a 'keywords' column".to_string())
        })?;
        let brand_col = column("brand_name");

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record
                .map_err(|e| AppError::InvalidRequest(format!("unreadable CSV row: {}", e)))?;
            let field = |index: usize| record.get(index).unwrap_or_default().to_string();

            let brand = brand_col.map(field).filter(|b| !b.is_empty());
            rows.push(InputRow {
                url: field(url_col),
                keywords: field(keywords_col),
                brand_name: brand.unwrap_or_else(|| default_brand_name.to_string()),
            });
        }
        Ok(rows)
    }

    /// Parse a newline-separated URL list. Lines are trimmed, blanks are
    /// skipped and duplicates are dropped, keeping first-occurrence order.
    /// Keywords stay empty here; they are extracted from each fetched page.
    pub fn parse_url_list(urls_text: &str, default_brand_name: &str) -> AppResult<Vec<InputRow>> {
        let mut seen = std::collections::HashSet::new();
        let rows: Vec<InputRow> = urls_text
            .lines()
            .map(str::trim)
            .filter(|url| !url.is_empty() && seen.insert(url.to_string()))
            .map(|url| InputRow {
                url: url.to_string(),
                keywords: String::new(),
                brand_name: default_brand_name.to_string(),
            })
            .collect();

        if rows.is_empty() {
            return Err(AppError::InvalidRequest(
                "no valid URLs in the input".to_string(),
            ));
        }
        Ok(rows)
    }

    /// Process every row in input order. Always returns one outcome per
    /// input row; fetch errors, generation errors and timeouts are recorded
    /// on the row they hit. Progress is reported after each row completes.
    pub async fn run(
        &self,
        source: &BulkSource,
        options: &BulkOptions,
        progress: &dyn ProgressSink,
    ) -> AppResult<BulkResult> {
        let (inputs, auto_keywords) = match source {
            BulkSource::Csv(content) => (
                Self::parse_rows(content, &options.default_brand_name)?,
                false,
            ),
            BulkSource::Urls(text) => (
                Self::parse_url_list(text, &options.default_brand_name)?,
                true,
            ),
        };
        let total = inputs.len();
        info!(total, auto_keywords, "bulk processing started");

        let mut rows = Vec::with_capacity(total);
        for (index, input) in inputs.into_iter().enumerate() {
            let (keywords, outcome) = match timeout(
                options.row_timeout,
                self.process_row(&input, options, auto_keywords),
            )
            .await
            {
                Ok(Ok((keywords, content))) => (keywords, RowOutcome::Success { content }),
                Ok(Err(error)) => {
                    warn!(row = index + 1, url = %input.url, %error, "bulk row failed");
                    (input.keywords.clone(), RowOutcome::Failure { error })
                }
                Err(_) => {
                    let error = format!(
                        "timed out after {} seconds",
                        options.row_timeout.as_secs()
                    );
                    warn!(row = index + 1, url = %input.url, %error, "bulk row timed out");
                    (input.keywords.clone(), RowOutcome::Failure { error })
                }
            };

            self.metrics
                .record_bulk_row(matches!(outcome, RowOutcome::Success { .. }));
            rows.push(BulkRow {
                url: input.url,
                keywords,
                brand_name: input.brand_name,
                outcome,
            });

            progress
                .report(
                    (10 + (index + 1) * 80 / total.max(1)) as u8,
                    format!("Processed row {} of {}", index + 1, total),
                )
                .await;
        }

        progress.report(95, "Assembling report".to_string()).await;
        info!(
            total,
            failed = rows
                .iter()
                .filter(|r| matches!(r.outcome, RowOutcome::Failure { .. }))
                .count(),
            "bulk processing finished"
        );
        Ok(BulkResult { rows })
    }

    /// Returns the keywords actually used alongside the content, since
    /// URL-list rows only learn their keywords after the page is fetched.
    async fn process_row(
        &self,
        input: &InputRow,
        options: &BulkOptions,
        auto_keywords: bool,
    ) -> Result<(String, SeoContent), String> {
        if input.url.is_empty() || (!auto_keywords && input.keywords.is_empty()) {
            return Err("missing URL or keywords".to_string());
        }

        let page_text = self
            .fetcher
            .fetch_text(&input.url)
            .await
            .map_err(|e| format!("fetch failed: {}", e))?;

        let keywords = if auto_keywords {
            keywords::extract_keywords(&page_text, keywords::MAX_AUTO_KEYWORDS).join(", ")
        } else {
            input.keywords.clone()
        };

        let generation_input = GenerationInput {
            page_text,
            keywords: keywords.clone(),
            brand_name: input.brand_name.clone(),
            selling_points: options.default_selling_points.clone(),
        };

        let content = self
            .generator
            .seo_content(
                &generation_input,
                options.content_type,
                options.num_variations,
            )
            .await
            .map_err(|e| e.to_string())?;
        Ok((keywords, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use crate::types::{AdCopy, GenerationError};
    use tokio::sync::Mutex;

    /// Fetcher that fails for URLs containing "bad".
    struct MarkedFetcher;

    #[async_trait]
    impl PageFetch for MarkedFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            if url.contains("bad") {
                Err(FetchError::Status(404))
            } else {
                Ok(format!("content of {}", url))
            }
        }
    }

    /// Generator that fails for keywords containing "fail" and can be told
    /// to stall to trigger row timeouts.
    struct MarkedGenerator {
        stall_on: Option<String>,
    }

    #[async_trait]
    impl ContentGenerator for MarkedGenerator {
        async fn ad_copy(&self, _input: &GenerationInput) -> Result<AdCopy, GenerationError> {
            unreachable!("bulk processing only generates SEO content")
        }

        async fn seo_content(
            &self,
            input: &GenerationInput,
            _content_type: ContentType,
            _variations: u8,
        ) -> Result<SeoContent, GenerationError> {
            if let Some(stall) = &self.stall_on {
                if input.keywords.contains(stall.as_str()) {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
            }
            if input.keywords.contains("fail") {
                return Err(GenerationError::Parse("no payload".to_string()));
            }
            Ok(SeoContent {
                titles: vec![format!("title for {}", input.keywords)],
                descriptions: vec!["desc".to_string()],
            })
        }
    }

    struct RecordingSink {
        updates: Mutex<Vec<(u8, String)>>,
    }

    #[async_trait]
    impl ProgressSink for RecordingSink {
        async fn report(&self, percent: u8, message: String) {
            self.updates.lock().await.push((percent, message));
        }
    }

    fn processor(stall_on: Option<&str>) -> BulkProcessor {
        BulkProcessor::new(
            Arc::new(MarkedFetcher),
            Arc::new(MarkedGenerator {
                stall_on: stall_on.map(str::to_string),
            }),
            Arc::new(Metrics::default()),
        )
    }

    fn csv_source(csv: &str) -> BulkSource {
        BulkSource::Csv(csv.to_string())
    }

    fn options(row_timeout: Duration) -> BulkOptions {
        BulkOptions {
            default_brand_name: "Default".to_string(),
            default_selling_points: String::new(),
            content_type: ContentType::Both,
            num_variations: 3,
            row_timeout,
        }
    }

    #[test]
    fn test_parse_rows_applies_default_brand() {
        let csv = "url,keywords,brand_name\nhttps://a.example,kw1,Acme\nhttps://b.example,kw2,\n";
        let rows = BulkProcessor::parse_rows(csv, "Default").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].brand_name, "Acme");
        assert_eq!(rows[1].brand_name, "Default");
    }

    #[test]
    fn test_parse_rows_without_brand_column() {
        let csv = "url,keywords\nhttps://a.example,kw1\n";
        let rows = BulkProcessor::parse_rows(csv, "Default").unwrap();
        assert_eq!(rows[0].brand_name, "Default");
    }

    #[test]
    fn test_parse_rows_requires_url_and_keywords_columns() {
        assert!(BulkProcessor::parse_rows("keywords\nkw\n", "d").is_err());
        assert!(BulkProcessor::parse_rows("url\nhttps://a.example\n", "d").is_err());
    }

    #[test]
    fn test_parse_url_list_trims_dedupes_and_keeps_order() {
        let text = " https://a.example \n\nhttps://b.example\nhttps://a.example\n";
        let rows = BulkProcessor::parse_url_list(text, "Default").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].url, "https://a.example");
        assert_eq!(rows[1].url, "https://b.example");
        assert!(rows[0].keywords.is_empty());
        assert_eq!(rows[0].brand_name, "Default");

        assert!(BulkProcessor::parse_url_list("\n  \n", "Default").is_err());
    }

    #[tokio::test]
    async fn test_url_list_rows_get_keywords_from_page_content() {
        struct WordyFetcher;

        #[async_trait]
        impl PageFetch for WordyFetcher {
            async fn fetch_text(&self, _url: &str) -> Result<String, FetchError> {
                Ok("running shoes running shoes running trail comfort comfort \
                    comfort cushioning cushioning support"
                    .to_string())
            }
        }

        let bulk = BulkProcessor::new(
            Arc::new(WordyFetcher),
            Arc::new(MarkedGenerator { stall_on: None }),
            Arc::new(Metrics::default()),
        );
        let source = BulkSource::Urls("https://a.example\nhttps://b.example\n".to_string());
        let result = bulk
            .run(&source, &options(Duration::from_secs(5)), &NoProgress)
            .await
            .unwrap();

        assert_eq!(result.rows.len(), 2);
        assert_eq!(
            result.rows[0].keywords,
            "running, comfort, shoes, cushioning, trail"
        );
        assert!(matches!(result.rows[0].outcome, RowOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn test_url_list_fetch_failures_recorded_inline() {
        let source = BulkSource::Urls(
            "https://bad.example\nhttps://c.example\n".to_string(),
        );
        let result = processor(None)
            .run(&source, &options(Duration::from_secs(5)), &NoProgress)
            .await
            .unwrap();

        assert_eq!(result.rows.len(), 2);
        match &result.rows[0].outcome {
            RowOutcome::Failure { error } => assert!(error.contains("fetch failed")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(matches!(result.rows[1].outcome, RowOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn test_output_preserves_input_order_with_failures_inline() {
        let csv = "url,keywords\n\
                   https://a.example,kw-a\n\
                   https://bad.example,kw-b\n\
                   https://c.example,kw-c\n";
        let result = processor(None)
            .run(&csv_source(csv), &options(Duration::from_secs(5)), &NoProgress)
            .await
            .unwrap();

        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[0].url, "https://a.example");
        assert!(matches!(result.rows[0].outcome, RowOutcome::Success { .. }));
        assert_eq!(result.rows[1].url, "https://bad.example");
        match &result.rows[1].outcome {
            RowOutcome::Failure { error } => assert!(error.contains("fetch failed")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(result.rows[2].url, "https://c.example");
        assert!(matches!(result.rows[2].outcome, RowOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn test_generation_error_does_not_stop_subsequent_rows() {
        let csv = "url,keywords\n\
                   https://a.example,will-fail\n\
                   https://b.example,kw-b\n";
        let result = processor(None)
            .run(&csv_source(csv), &options(Duration::from_secs(5)), &NoProgress)
            .await
            .unwrap();

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.failure_count(), 1);
        assert!(matches!(result.rows[1].outcome, RowOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn test_row_timeout_is_recorded_and_processing_continues() {
        let csv = "url,keywords\n\
                   https://a.example,slow-kw\n\
                   https://b.example,kw-b\n";
        let result = processor(Some("slow"))
            .run(&csv_source(csv), &options(Duration::from_millis(50)), &NoProgress)
            .await
            .unwrap();

        match &result.rows[0].outcome {
            RowOutcome::Failure { error } => assert!(error.contains("timed out")),
            other => panic!("expected timeout failure, got {:?}", other),
        }
        assert!(matches!(result.rows[1].outcome, RowOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn test_missing_fields_recorded_without_fetching() {
        let csv = "url,keywords\n,kw-a\nhttps://b.example,\n";
        let result = processor(None)
            .run(&csv_source(csv), &options(Duration::from_secs(5)), &NoProgress)
            .await
            .unwrap();

        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.failure_count(), 2);
        for row in &result.rows {
            match &row.outcome {
                RowOutcome::Failure { error } => {
                    assert!(error.contains("missing URL or keywords"))
                }
                other => panic!("expected failure, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_progress_reported_per_row_and_non_decreasing() {
        let csv = "url,keywords\n\
                   https://a.example,kw-a\n\
                   https://b.example,kw-b\n\
                   https://c.example,kw-c\n";
        let sink = RecordingSink {
            updates: Mutex::new(Vec::new()),
        };
        processor(None)
            .run(&csv_source(csv), &options(Duration::from_secs(5)), &sink)
            .await
            .unwrap();

        let updates = sink.updates.lock().await;
        // One update after each completed row plus the final assembly update.
        assert_eq!(updates.len(), 4);
        assert_eq!(updates[0].1, "Processed row 1 of 3");
        let percents: Vec<u8> = updates.iter().map(|(p, _)| *p).collect();
        assert_eq!(percents, vec![36, 63, 90, 95]);
    }

    #[tokio::test]
    async fn test_two_row_batch_renders_full_report() {
        let csv = "url,keywords,brand_name\n\
                   https://a.example,\"kw1,kw2\",\n\
                   https://bad.example,kw3,BrandX\n";
        let opts = options(Duration::from_secs(5));
        let result = processor(None).run(&csv_source(csv), &opts, &NoProgress).await.unwrap();
        let report = report::write_report(&result, opts.content_type).unwrap();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("URL,Keywords,Brand Name,Title 1"));
        // Good row keeps its keywords and falls back to the default brand.
        assert!(lines[1].starts_with("https://a.example,\"kw1,kw2\",Default,"));
        // Failed row: ERROR marker, its own brand, the message, then padding.
        assert!(lines[2].starts_with("https://bad.example,ERROR,BrandX,fetch failed"));
        assert_eq!(lines[2].split(',').count(), lines[0].split(',').count());
    }

    #[tokio::test]
    async fn test_empty_csv_yields_empty_result() {
        let csv = "url,keywords\n";
        let result = processor(None)
            .run(&csv_source(csv), &options(Duration::from_secs(5)), &NoProgress)
            .await
            .unwrap();
        assert!(result.rows.is_empty());
    }
}
