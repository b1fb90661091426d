//! Coverage gate between classification and synthesis.

use std::collections::BTreeSet;
use thesis_core::{ClassifiedDeck, Error, PitchCategory, Result};

/// Minimum number of distinct pitch sections needed to run an analysis.
pub const MIN_COVERED_CATEGORIES: usize = 3;

/// Distinct known categories present in the deck. `Unclassified` never counts.
pub fn covered_categories(deck: &ClassifiedDeck) -> BTreeSet<PitchCategory> {
    deck.categorized().map(|(category, _)| category).collect()
}

/// Return the covered categories, or fail when there are too few of them.
pub fn check_coverage(deck: &ClassifiedDeck) -> Result<BTreeSet<PitchCategory>> {
    let covered = covered_categories(deck);

    if covered.len() < MIN_COVERED_CATEGORIES {
        return Err(Error::InsufficientCoverage {
            found: covered.len(),
            required: MIN_COVERED_CATEGORIES,
        });
    }

    Ok(covered)
}
