//! Normalization of free-form model answers into closed label sets.
//!
//! Models do not reliably answer with the exact label they were asked for:
//! they add punctuation, change case, prefix the answer with `Category:`, or
//! echo a compound label such as `Solution/Product`. Everything here folds an
//! answer down to a canonical comparison key before matching.

use crate::types::{PitchCategory, SlideLabel};
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse whitespace runs into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Regex matching a leading "Category:"-style preamble.
static LABEL_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(category|label|answer|classification|section)\s*[:=\-]\s*").unwrap()
});

/// Fold text into a comparison key.
///
/// - Applies NFKC so full-width and compatibility forms compare equal
/// - Lowercases
/// - Replaces every non-alphanumeric character with a space
/// - Collapses whitespace and trims
pub fn fold_label(text: &str) -> String {
    let composed: String = text.nfkc().collect();
    let replaced: String = composed
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    WHITESPACE_COLLAPSE_REGEX
        .replace_all(&replaced, " ")
        .trim()
        .to_string()
}

/// Reduce a raw classification answer to the comparison key of its label.
///
/// Only the first non-empty line is considered, and a leading
/// `Category:`-style preamble is dropped.
pub fn normalize_answer(answer: &str) -> String {
    let first_line = answer
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");

    let without_prefix = LABEL_PREFIX_REGEX.replace(first_line, "");
    fold_label(&without_prefix)
}

/// Match a classification answer against the closed label set.
///
/// Returns `None` when the answer is not a recognizable label; callers treat
/// that as [`SlideLabel::Unclassified`].
pub fn parse_slide_label(answer: &str) -> Option<SlideLabel> {
    let key = normalize_answer(answer);

    let category = match key.as_str() {
        "problem" | "problems" | "the problem" | "problem statement" => PitchCategory::Problem,
        "solution" | "product" | "solution product" | "product solution" | "the solution" => {
            PitchCategory::Solution
        }
        "market" | "market size" | "market opportunity" | "the market" => PitchCategory::Market,
        "business model" | "businessmodel" | "revenue model" => PitchCategory::BusinessModel,
        "competition" | "competitors" | "competitive landscape" => PitchCategory::Competition,
        "team" | "the team" => PitchCategory::Team,
        "financials" | "financial" | "financial projections" => PitchCategory::Financials,
        "traction" => PitchCategory::Traction,
        "funding ask" | "fundingask" | "funding" | "ask" | "the ask" => PitchCategory::FundingAsk,
        "unclassified" => return Some(SlideLabel::Unclassified),
        _ => return None,
    };

    Some(SlideLabel::Category(category))
}
