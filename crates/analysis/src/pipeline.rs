//! End-to-end pipeline: load, classify, gate, synthesize.
//!
//! Every run owns its own [`PipelineContext`]; the only thing shared between
//! runs is the model client, borrowed immutably.

use crate::classifier::SlideClassifier;
use crate::client::ModelClient;
use crate::coverage::check_coverage;
use crate::synthesizer::ThesisSynthesizer;
use std::collections::BTreeSet;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use thesis_core::{
    AnalysisRecord, ClassifiedDeck, Error, PitchCategory, Result, SchemaIssue, Slide,
    ValidationError, ValidationMode,
};
use thesis_pptx::{is_zip, PptxLoader};

pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;
pub const MIN_SLIDES: usize = 5;
pub const MAX_SLIDES: usize = 20;

/// Input bounds checked before any model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckLimits {
    pub max_file_bytes: u64,
    pub min_slides: usize,
    pub max_slides: usize,
}

impl Default for DeckLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: MAX_FILE_BYTES,
            min_slides: MIN_SLIDES,
            max_slides: MAX_SLIDES,
        }
    }
}

impl DeckLimits {
    pub fn check_file_size(&self, size: u64) -> std::result::Result<(), ValidationError> {
        if size > self.max_file_bytes {
            return Err(ValidationError::FileTooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }

    pub fn check_slide_count(&self, count: usize) -> std::result::Result<(), ValidationError> {
        if !(self.min_slides..=self.max_slides).contains(&count) {
            return Err(ValidationError::SlideCount {
                count,
                min: self.min_slides,
                max: self.max_slides,
            });
        }
        Ok(())
    }
}

/// Everything a single run produced.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Name of the uploaded deck, without extension.
    pub source_name: String,
    pub slide_count: usize,
    pub deck: ClassifiedDeck,
    pub covered: BTreeSet<PitchCategory>,
    pub analysis: AnalysisRecord,
    /// Schema problems accepted in permissive mode.
    pub schema_issues: Vec<SchemaIssue>,
}

impl PipelineContext {
    /// Slides that could not be classified.
    pub fn degraded_slides(&self) -> Vec<usize> {
        self.deck.unclassified_indices()
    }
}

/// Sequential deck analysis pipeline.
pub struct Pipeline<C> {
    client: C,
    limits: DeckLimits,
    mode: ValidationMode,
}

impl<C: ModelClient> Pipeline<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            limits: DeckLimits::default(),
            mode: ValidationMode::default(),
        }
    }

    pub fn with_limits(mut self, limits: DeckLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate and extract a deck. Makes no model calls.
    pub fn load_deck(&self, bytes: &[u8]) -> Result<Vec<Slide>> {
        self.limits.check_file_size(bytes.len() as u64)?;

        if !is_zip(bytes) {
            return Err(Error::Format(
                "not a .pptx file (missing ZIP signature)".to_string(),
            ));
        }

        let loader = PptxLoader::new();
        let count = loader.load(Cursor::new(bytes))?;
        self.limits.check_slide_count(count)?;

        let slides = loader.extract(Cursor::new(bytes))?;

        if !slides.iter().any(Slide::has_text) {
            return Err(ValidationError::NoReadableText.into());
        }

        Ok(slides)
    }

    /// Run the pipeline on a file on disk.
    ///
    /// The size limit is checked against file metadata before reading.
    pub fn run_path(&self, path: &Path) -> Result<PipelineContext> {
        let size = fs::metadata(path)?.len();
        self.limits.check_file_size(size)?;

        let bytes = fs::read(path)?;
        let source_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("deck");

        self.run_bytes(&bytes, source_name)
    }

    /// Run the pipeline on an in-memory deck.
    pub fn run_bytes(&self, bytes: &[u8], source_name: &str) -> Result<PipelineContext> {
        let slides = self.load_deck(bytes)?;
        let slide_count = slides.len();
        log::info!("Loaded '{}' with {} slides", source_name, slide_count);

        let deck = SlideClassifier::new(&self.client).classify_all(slides)?;
        log::info!(
            "Classified {} slides ({} unclassified)",
            deck.len(),
            deck.unclassified_indices().len()
        );

        let covered = check_coverage(&deck)?;
        log::info!(
            "Coverage: {}",
            covered
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let parsed = ThesisSynthesizer::new(&self.client)
            .with_validation_mode(self.mode)
            .run(&deck)?;

        Ok(PipelineContext {
            source_name: source_name.to_string(),
            slide_count,
            deck,
            covered,
            analysis: parsed.record,
            schema_issues: parsed.issues,
        })
    }
}
