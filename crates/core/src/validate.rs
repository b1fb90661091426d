//! Strict schema validation for parsed analysis records.
//!
//! Decoupled from [`crate::extract`]: extraction accepts anything that parses
//! as a JSON object, and this module reports how far the result strays from
//! the expected shape. [`ValidationMode`] decides whether that is fatal.

use crate::record::AnalysisRecord;
use crate::rubric::RubricDimension;
use crate::{Error, Result};
use std::collections::HashSet;
use std::fmt;

/// Allowed number of strengths and of weaknesses.
pub const LIST_LEN_RANGE: std::ops::RangeInclusive<usize> = 3..=5;

/// How schema problems in an analysis are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Log problems and accept the record.
    #[default]
    Permissive,
    /// Reject any record with problems.
    Strict,
}

/// A single way a record deviates from the expected schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    MissingRecommendation,
    UnknownRecommendation(String),
    MissingOverallScore,
    OverallScoreOutOfRange(i64),
    MissingConfidenceScore,
    ConfidenceScoreOutOfRange(i64),
    StrengthCount(usize),
    WeaknessCount(usize),
    EmptyRecommendationText,
    CategoryCount(usize),
    UnknownCategory(String),
    DuplicateCategory(RubricDimension),
    MissingCategory(RubricDimension),
    MissingCategoryScore(RubricDimension),
    CategoryScoreOutOfRange { dimension: RubricDimension, score: i64 },
    WeightMismatch {
        dimension: RubricDimension,
        expected: u32,
        found: Option<i64>,
    },
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRecommendation => write!(f, "recommendation is missing"),
            Self::UnknownRecommendation(r) => write!(f, "unknown recommendation '{}'", r),
            Self::MissingOverallScore => write!(f, "overall_score is missing"),
            Self::OverallScoreOutOfRange(s) => write!(f, "overall_score {} is outside 0-100", s),
            Self::MissingConfidenceScore => write!(f, "confidence_score is missing"),
            Self::ConfidenceScoreOutOfRange(s) => {
                write!(f, "confidence_score {} is outside 0-100", s)
            }
            Self::StrengthCount(n) => write!(f, "{} strengths given, expected 3-5", n),
            Self::WeaknessCount(n) => write!(f, "{} weaknesses given, expected 3-5", n),
            Self::EmptyRecommendationText => write!(f, "recommendation_text is empty"),
            Self::CategoryCount(n) => write!(f, "{} categories given, expected 9", n),
            Self::UnknownCategory(name) => write!(f, "unknown category '{}'", name),
            Self::DuplicateCategory(d) => write!(f, "category '{}' appears more than once", d),
            Self::MissingCategory(d) => write!(f, "category '{}' is missing", d),
            Self::MissingCategoryScore(d) => write!(f, "category '{}' has no score", d),
            Self::CategoryScoreOutOfRange { dimension, score } => {
                write!(f, "category '{}' score {} is outside 0-10", dimension, score)
            }
            Self::WeightMismatch {
                dimension,
                expected,
                found,
            } => match found {
                Some(w) => write!(
                    f,
                    "category '{}' weight {}% differs from rubric weight {}%",
                    dimension, w, expected
                ),
                None => write!(
                    f,
                    "category '{}' has no weight, rubric weight is {}%",
                    dimension, expected
                ),
            },
        }
    }
}

fn check_percent(
    value: Option<i64>,
    missing: SchemaIssue,
    out_of_range: fn(i64) -> SchemaIssue,
    issues: &mut Vec<SchemaIssue>,
) {
    match value {
        None => issues.push(missing),
        Some(v) if !(0..=100).contains(&v) => issues.push(out_of_range(v)),
        Some(_) => {}
    }
}

/// List every schema problem in a record. An empty list means the record is
/// complete and in range.
pub fn validate(record: &AnalysisRecord) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();

    match &record.recommendation {
        None => issues.push(SchemaIssue::MissingRecommendation),
        Some(r) if !r.is_known() => issues.push(SchemaIssue::UnknownRecommendation(r.to_string())),
        Some(_) => {}
    }

    check_percent(
        record.overall_score,
        SchemaIssue::MissingOverallScore,
        SchemaIssue::OverallScoreOutOfRange,
        &mut issues,
    );
    check_percent(
        record.confidence_score,
        SchemaIssue::MissingConfidenceScore,
        SchemaIssue::ConfidenceScoreOutOfRange,
        &mut issues,
    );

    if !LIST_LEN_RANGE.contains(&record.strengths.len()) {
        issues.push(SchemaIssue::StrengthCount(record.strengths.len()));
    }
    if !LIST_LEN_RANGE.contains(&record.weaknesses.len()) {
        issues.push(SchemaIssue::WeaknessCount(record.weaknesses.len()));
    }
    if record.recommendation_text.trim().is_empty() {
        issues.push(SchemaIssue::EmptyRecommendationText);
    }

    if record.categories.len() != RubricDimension::ALL.len() {
        issues.push(SchemaIssue::CategoryCount(record.categories.len()));
    }

    let mut seen = HashSet::new();
    for category in &record.categories {
        let Some(dimension) = category.dimension() else {
            issues.push(SchemaIssue::UnknownCategory(category.name.clone()));
            continue;
        };
        if !seen.insert(dimension) {
            issues.push(SchemaIssue::DuplicateCategory(dimension));
            continue;
        }

        match category.score {
            None => issues.push(SchemaIssue::MissingCategoryScore(dimension)),
            Some(score) if !(0..=10).contains(&score) => {
                issues.push(SchemaIssue::CategoryScoreOutOfRange { dimension, score })
            }
            Some(_) => {}
        }

        let expected = dimension.weight();
        if category.weight != Some(i64::from(expected)) {
            issues.push(SchemaIssue::WeightMismatch {
                dimension,
                expected,
                found: category.weight,
            });
        }
    }

    for dimension in RubricDimension::ALL {
        if !seen.contains(&dimension) {
            issues.push(SchemaIssue::MissingCategory(dimension));
        }
    }

    issues
}

/// Validate a record under the given mode.
///
/// Permissive mode logs every issue and returns them; strict mode fails with
/// [`Error::Schema`] when there is at least one.
pub fn enforce(record: &AnalysisRecord, mode: ValidationMode) -> Result<Vec<SchemaIssue>> {
    let issues = validate(record);

    match mode {
        ValidationMode::Strict if !issues.is_empty() => Err(Error::Schema(issues)),
        ValidationMode::Strict => Ok(issues),
        ValidationMode::Permissive => {
            for issue in &issues {
                log::warn!("Analysis schema issue (accepted): {}", issue);
            }
            Ok(issues)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CategoryScore, Recommendation};

    fn complete_record() -> AnalysisRecord {
        AnalysisRecord {
            recommendation: Some(Recommendation::StrongBuy),
            overall_score: Some(82),
            confidence_score: Some(75),
            strengths: vec!["a".into(), "b".into(), "c".into()],
            weaknesses: vec!["d".into(), "e".into(), "f".into(), "g".into()],
            recommendation_text: "Invest.".into(),
            categories: RubricDimension::ALL
                .iter()
                .map(|d| CategoryScore {
                    name: d.name().to_string(),
                    score: Some(8),
                    weight: Some(i64::from(d.weight())),
                    feedback: "ok".into(),
                })
                .collect(),
            processing_date: "2024-01-01 00:00:00 UTC".into(),
        }
    }

    #[test]
    fn test_complete_record_has_no_issues() {
        assert!(validate(&complete_record()).is_empty());
    }

    #[test]
    fn test_empty_record_reports_everything() {
        let issues = validate(&AnalysisRecord::default());

        assert!(issues.contains(&SchemaIssue::MissingRecommendation));
        assert!(issues.contains(&SchemaIssue::MissingOverallScore));
        assert!(issues.contains(&SchemaIssue::MissingConfidenceScore));
        assert!(issues.contains(&SchemaIssue::StrengthCount(0)));
        assert!(issues.contains(&SchemaIssue::WeaknessCount(0)));
        assert!(issues.contains(&SchemaIssue::EmptyRecommendationText));
        assert!(issues.contains(&SchemaIssue::CategoryCount(0)));
        assert!(issues.contains(&SchemaIssue::MissingCategory(RubricDimension::Clarity)));
    }

    #[test]
    fn test_out_of_range_scores() {
        let mut record = complete_record();
        record.overall_score = Some(120);
        record.confidence_score = Some(-1);
        record.categories[2].score = Some(11);

        let issues = validate(&record);
        assert_eq!(
            issues,
            vec![
                SchemaIssue::OverallScoreOutOfRange(120),
                SchemaIssue::ConfidenceScoreOutOfRange(-1),
                SchemaIssue::CategoryScoreOutOfRange {
                    dimension: RubricDimension::Market,
                    score: 11
                },
            ]
        );
    }

    #[test]
    fn test_weight_mismatch_is_flagged() {
        let mut record = complete_record();
        record.categories[0].weight = Some(25);

        assert_eq!(
            validate(&record),
            vec![SchemaIssue::WeightMismatch {
                dimension: RubricDimension::Problem,
                expected: 10,
                found: Some(25)
            }]
        );
    }

    #[test]
    fn test_unknown_and_duplicate_categories() {
        let mut record = complete_record();
        record.categories[8].name = "Funding Ask".into();
        record.categories.push(CategoryScore {
            name: "team".into(),
            score: Some(5),
            weight: Some(15),
            feedback: String::new(),
        });

        let issues = validate(&record);
        assert!(issues.contains(&SchemaIssue::CategoryCount(10)));
        assert!(issues.contains(&SchemaIssue::UnknownCategory("Funding Ask".into())));
        assert!(issues.contains(&SchemaIssue::DuplicateCategory(RubricDimension::Team)));
        assert!(issues.contains(&SchemaIssue::MissingCategory(RubricDimension::Clarity)));
    }

    #[test]
    fn test_unknown_recommendation() {
        let mut record = complete_record();
        record.recommendation = Some(Recommendation::Other("Buy".into()));
        assert_eq!(
            validate(&record),
            vec![SchemaIssue::UnknownRecommendation("Buy".into())]
        );
    }

    #[test]
    fn test_permissive_accepts_with_issues() {
        let mut record = complete_record();
        record.strengths.clear();

        let issues = enforce(&record, ValidationMode::Permissive).unwrap();
        assert_eq!(issues, vec![SchemaIssue::StrengthCount(0)]);
    }

    #[test]
    fn test_strict_rejects_with_issues() {
        let mut record = complete_record();
        record.weaknesses = vec!["only".into()];

        let err = enforce(&record, ValidationMode::Strict).unwrap_err();
        match err {
            Error::Schema(issues) => assert_eq!(issues, vec![SchemaIssue::WeaknessCount(1)]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_accepts_complete_record() {
        assert!(enforce(&complete_record(), ValidationMode::Strict)
            .unwrap()
            .is_empty());
    }
}
