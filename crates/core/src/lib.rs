//! Core domain types, model-output parsing, validation, and report rendering
//! for pitch deck investment analysis.

pub mod error;
pub mod extract;
pub mod normalize;
pub mod record;
pub mod report;
pub mod rubric;
pub mod types;
pub mod validate;

pub use error::{Error, Result, ValidationError};
pub use extract::{extract_json_object, parse_analysis, parse_analysis_at, strip_code_fences};
pub use normalize::parse_slide_label;
pub use record::{AnalysisRecord, CategoryScore, Recommendation};
pub use report::{JsonRenderer, MarkdownRenderer, RenderedReport, ReportRenderer};
pub use rubric::RubricDimension;
pub use types::{ClassifiedDeck, ClassifiedSlide, PitchCategory, Slide, SlideLabel};
pub use validate::{SchemaIssue, ValidationMode};
