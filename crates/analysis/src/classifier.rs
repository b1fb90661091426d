//! Per-slide classification into pitch-deck sections.

use crate::client::{CompletionRequest, ModelClient, ModelError};
use thesis_core::{parse_slide_label, ClassifiedDeck, PitchCategory, Result, Slide, SlideLabel};

/// Token budget for a one-word label.
pub const CLASSIFY_MAX_TOKENS: u32 = 16;

/// Build the closed-label classification prompt for one slide.
pub fn classification_prompt(raw_text: &str) -> String {
    let labels = PitchCategory::ALL
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Classify this slide content: '{}'\n\
         Return only one category from: {}.\n\
         If none of them fits, return Unclassified.\n\
         Answer with the category name only, no explanation.",
        raw_text.trim(),
        labels
    )
}

/// Classifies slides one model call at a time.
pub struct SlideClassifier<C> {
    client: C,
    max_tokens: u32,
}

impl<C: ModelClient> SlideClassifier<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            max_tokens: CLASSIFY_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Classify one slide's text.
    ///
    /// An answer outside the closed label set becomes `Unclassified`; only a
    /// failed model call is an error.
    pub fn classify(&self, raw_text: &str) -> std::result::Result<SlideLabel, ModelError> {
        let request = CompletionRequest::new(classification_prompt(raw_text), self.max_tokens);
        let answer = self.client.complete(&request)?;

        Ok(parse_slide_label(&answer).unwrap_or_else(|| {
            log::debug!("Unrecognized category label '{}'", answer);
            SlideLabel::Unclassified
        }))
    }

    /// Classify every slide, in order.
    ///
    /// A failed call degrades that slide to `Unclassified` and the run
    /// continues. Slides with no text are not sent to the model. Rejected
    /// credentials abort the whole run, as does a run in which every call
    /// failed; the last call's error is returned.
    pub fn classify_all(&self, slides: Vec<Slide>) -> Result<ClassifiedDeck> {
        let mut classified = Vec::with_capacity(slides.len());
        let mut attempted = 0;
        let mut failed = 0;
        let mut last_error = None;

        for slide in slides {
            if !slide.has_text() {
                log::debug!("Slide {} has no text, leaving it unclassified", slide.index);
                classified.push(slide.classify(SlideLabel::Unclassified));
                continue;
            }

            attempted += 1;
            let label = match self.classify(&slide.raw_text) {
                Ok(label) => label,
                Err(e) if e.is_auth_failure() => return Err(e.into()),
                Err(e) => {
                    log::warn!("Slide {} classification failed, marking unclassified: {}", slide.index, e);
                    failed += 1;
                    last_error = Some(e);
                    SlideLabel::Unclassified
                }
            };

            log::debug!("Slide {} -> {}", slide.index, label);
            classified.push(slide.classify(label));
        }

        if let Some(err) = last_error.filter(|_| failed == attempted) {
            log::error!("All {} classification calls failed", attempted);
            return Err(err.into());
        }

        Ok(ClassifiedDeck::new(classified))
    }
}
