//! Domain types for slides and their pitch-section classification.

use serde::{Serialize, Serializer};
use std::fmt;

/// The closed set of pitch-deck sections a slide can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PitchCategory {
    Problem,
    Solution,
    Market,
    BusinessModel,
    Competition,
    Team,
    Financials,
    Traction,
    FundingAsk,
}

impl PitchCategory {
    /// All categories, in the order they are listed to the model.
    pub const ALL: [PitchCategory; 9] = [
        Self::Problem,
        Self::Solution,
        Self::Market,
        Self::BusinessModel,
        Self::Competition,
        Self::Team,
        Self::Financials,
        Self::Traction,
        Self::FundingAsk,
    ];

    /// Human-readable name, as used in prompts and reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Problem => "Problem",
            Self::Solution => "Solution",
            Self::Market => "Market",
            Self::BusinessModel => "Business Model",
            Self::Competition => "Competition",
            Self::Team => "Team",
            Self::Financials => "Financials",
            Self::Traction => "Traction",
            Self::FundingAsk => "Funding Ask",
        }
    }
}

impl fmt::Display for PitchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for PitchCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// The outcome of classifying one slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideLabel {
    Category(PitchCategory),
    /// The model failed, or answered with something outside the closed set.
    Unclassified,
}

impl SlideLabel {
    /// The known category, if any.
    pub fn category(self) -> Option<PitchCategory> {
        match self {
            Self::Category(c) => Some(c),
            Self::Unclassified => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Category(c) => c.name(),
            Self::Unclassified => "Unclassified",
        }
    }
}

impl From<PitchCategory> for SlideLabel {
    fn from(category: PitchCategory) -> Self {
        Self::Category(category)
    }
}

impl fmt::Display for SlideLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for SlideLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A slide as produced by the deck loader, not yet classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slide {
    /// 1-based slide number, stable across the pipeline.
    pub index: usize,

    /// Text of every text-bearing shape, space-joined.
    pub raw_text: String,
}

impl Slide {
    /// Create a new slide with the given number and text.
    pub fn new(index: usize, raw_text: impl Into<String>) -> Self {
        Self {
            index,
            raw_text: raw_text.into(),
        }
    }

    /// Whether any text was extracted from this slide.
    pub fn has_text(&self) -> bool {
        !self.raw_text.trim().is_empty()
    }

    /// Attach a classification, consuming the unclassified slide.
    pub fn classify(self, label: SlideLabel) -> ClassifiedSlide {
        ClassifiedSlide {
            index: self.index,
            raw_text: self.raw_text,
            label,
        }
    }
}

/// A slide that has been through the classifier exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedSlide {
    pub index: usize,
    pub raw_text: String,
    #[serde(rename = "category")]
    pub label: SlideLabel,
}

/// Every slide of a deck, classified, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedDeck {
    slides: Vec<ClassifiedSlide>,
}

impl ClassifiedDeck {
    pub fn new(slides: Vec<ClassifiedSlide>) -> Self {
        Self { slides }
    }

    pub fn slides(&self) -> &[ClassifiedSlide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Slides with a known category, paired with that category.
    pub fn categorized(&self) -> impl Iterator<Item = (PitchCategory, &ClassifiedSlide)> {
        self.slides
            .iter()
            .filter_map(|s| s.label.category().map(|c| (c, s)))
    }

    /// 1-based numbers of slides that ended up unclassified.
    pub fn unclassified_indices(&self) -> Vec<usize> {
        self.slides
            .iter()
            .filter(|s| s.label == SlideLabel::Unclassified)
            .map(|s| s.index)
            .collect()
    }
}
