//! CSV report rendering for bulk runs. One output row per input row, in
//! input order; title/description columns are padded to the maximum counts
//! seen across all rows, and failed rows carry an `ERROR` marker with the
//! failure message in the first content column.

use crate::bulk::{BulkResult, RowOutcome};
use crate::types::{AppError, AppResult, ContentType};

pub const ERROR_MARKER: &str = "ERROR";

pub fn write_report(result: &BulkResult, content_type: ContentType) -> AppResult<String> {
    let mut max_titles = 0usize;
    let mut max_descriptions = 0usize;
    for row in &result.rows {
        if let RowOutcome::Success { content } = &row.outcome {
            max_titles = max_titles.max(content.titles.len());
            max_descriptions = max_descriptions.max(content.descriptions.len());
        }
    }
    if !content_type.wants_titles() {
        max_titles = 0;
    }
    if !content_type.wants_descriptions() {
        max_descriptions = 0;
    }
    let content_columns = max_titles + max_descriptions;

    // Error rows need a message column even when no content columns exist.
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    let mut headers = vec![
        "URL".to_string(),
        "Keywords".to_string(),
        "Brand Name".to_string(),
    ];
    headers.extend((1..=max_titles).map(|i| format!("Title {}", i)));
    headers.extend((1..=max_descriptions).map(|i| format!("Description {}", i)));
    writer
        .write_record(&headers)
        .map_err(|e| AppError::Internal(format!("report write failed: {}", e)))?;

    for row in &result.rows {
        let record = match &row.outcome {
            RowOutcome::Success { content } => {
                let mut record = vec![
                    row.url.clone(),
                    row.keywords.clone(),
                    row.brand_name.clone(),
                ];
                if content_type.wants_titles() {
                    pad_into(&mut record, &content.titles, max_titles);
                }
                if content_type.wants_descriptions() {
                    pad_into(&mut record, &content.descriptions, max_descriptions);
                }
                record
            }
            RowOutcome::Failure { error } => {
                let mut record = vec![
                    row.url.clone(),
                    ERROR_MARKER.to_string(),
                    row.brand_name.clone(),
                    error.clone(),
                ];
                record.extend(
                    std::iter::repeat(String::new()).take(content_columns.saturating_sub(1)),
                );
                record
            }
        };
        writer
            .write_record(&record)
            .map_err(|e| AppError::Internal(format!("report write failed: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("report write failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("report not UTF-8: {}", e)))
}

fn pad_into(record: &mut Vec<String>, values: &[String], width: usize) {
    for i in 0..width {
        record.push(values.get(i).cloned().unwrap_or_default());
    }
}
