//! Model-driven pitch deck analysis: slide classification, the coverage
//! gate, thesis synthesis, and the pipeline that runs them in order.

pub mod classifier;
pub mod client;
pub mod coverage;
pub mod pipeline;
pub mod synthesizer;

#[cfg(test)]
mod testing;

pub use classifier::SlideClassifier;
pub use client::{CompletionClient, CompletionRequest, ModelClient, ModelConfig, ModelError};
pub use coverage::{check_coverage, covered_categories};
pub use pipeline::{DeckLimits, Pipeline, PipelineContext};
pub use synthesizer::{build_prompt, ParsedAnalysis, ThesisSynthesizer};
