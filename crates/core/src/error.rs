//! Error types for the deck analysis pipeline.

use crate::validate::SchemaIssue;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can halt the pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The deck was readable but violates an input constraint.
    #[error("Invalid deck: {0}")]
    Validation(#[from] ValidationError),

    /// The file is not a presentation container we can parse.
    #[error("Unreadable presentation: {0}")]
    Format(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// Client setup problem, such as a missing API key.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The completions endpoint answered with a non-success status.
    #[error("Model API error: {status} - {body}")]
    ModelApi { status: u16, body: String },

    /// The completions endpoint could not be reached or answered garbage.
    #[error("Model request failed: {0}")]
    ModelTransport(String),

    /// The synthesis answer did not contain a parseable JSON object.
    #[error("Malformed model output: {reason}\nModel output was:\n{cleaned}")]
    MalformedOutput {
        reason: String,
        /// The cleaned text the parser looked at, for diagnostics.
        cleaned: String,
    },

    /// Too few distinct pitch sections were found to run an analysis.
    #[error("Insufficient coverage: found {found} of the required {required} pitch sections")]
    InsufficientCoverage { found: usize, required: usize },

    /// Strict validation rejected the analysis.
    #[error("Analysis failed validation: {}", join_issues(.0))]
    Schema(Vec<SchemaIssue>),
}

/// Input constraints checked before any model call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("file size {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("deck has {count} slides; expected between {min} and {max}")]
    SlideCount { count: usize, min: usize, max: usize },

    #[error("no readable text found in the deck")]
    NoReadableText,
}

fn join_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
