//! Lenient extraction of the JSON object from a synthesis answer.
//!
//! Handles answers like:
//!
//! ````text
//! Here is the result:
//! ```json
//! {"recommendation": "Hold", ...}
//! ```
//! Thanks
//! ````
//!
//! Fences are stripped, then everything from the first `{` to the last `}` is
//! parsed. No schema checks happen here.

use crate::record::AnalysisRecord;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Format of [`AnalysisRecord::processing_date`].
pub const PROCESSING_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Regex matching Markdown code-fence markers, optionally tagged `json`.
static CODE_FENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?").unwrap());

/// Remove Markdown code-fence markers and trim.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE_REGEX.replace_all(text, "").trim().to_string()
}

/// Pull the outermost JSON object out of a model answer.
pub fn extract_json_object(raw: &str) -> Result<Value> {
    let cleaned = strip_code_fences(raw);

    let bounds = cleaned
        .find('{')
        .zip(cleaned.rfind('}'))
        .filter(|(start, end)| start < end);

    let Some((start, end)) = bounds else {
        log::debug!("No JSON object boundaries in model output: {}", cleaned);
        return Err(Error::MalformedOutput {
            reason: "no JSON object found in the model output".to_string(),
            cleaned,
        });
    };

    match serde_json::from_str::<Value>(&cleaned[start..=end]) {
        Ok(value) => Ok(value),
        Err(e) => {
            log::debug!("Model output is not valid JSON ({}): {}", e, cleaned);
            Err(Error::MalformedOutput {
                reason: format!("invalid JSON: {}", e),
                cleaned,
            })
        }
    }
}

/// Parse a synthesis answer into a record stamped with `now`.
///
/// Whatever `processing_date` the model produced is replaced.
pub fn parse_analysis_at(raw: &str, now: DateTime<Utc>) -> Result<AnalysisRecord> {
    let value = extract_json_object(raw)?;

    let mut record: AnalysisRecord =
        serde_json::from_value(value).map_err(|e| Error::MalformedOutput {
            reason: format!("unexpected JSON shape: {}", e),
            cleaned: strip_code_fences(raw),
        })?;

    record.processing_date = now.format(PROCESSING_DATE_FORMAT).to_string();
    Ok(record)
}

/// Parse a synthesis answer into a record stamped with the current UTC time.
pub fn parse_analysis(raw: &str) -> Result<AnalysisRecord> {
    parse_analysis_at(raw, Utc::now())
}
