//! The structured investment analysis produced by the synthesis stage.
//!
//! Every field deserializes leniently: a model that omits a field, returns a
//! score as `"85"` or a single string where a list was expected still yields
//! a record. Checking that the record is complete and in range is the job of
//! [`crate::validate`].

use crate::normalize::fold_label;
use crate::rubric::RubricDimension;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Investment recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    StrongBuy,
    Hold,
    Pass,
    /// Anything else the model said, kept verbatim.
    Other(String),
}

impl Recommendation {
    pub fn from_label(label: &str) -> Self {
        match fold_label(label).as_str() {
            "strong buy" | "strongbuy" => Self::StrongBuy,
            "hold" => Self::Hold,
            "pass" => Self::Pass,
            _ => Self::Other(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Hold => "Hold",
            Self::Pass => "Pass",
            Self::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One rubric entry of the analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    #[serde(default, deserialize_with = "lenient_string", alias = "category")]
    pub name: String,

    /// Score out of 10.
    #[serde(default, deserialize_with = "lenient_int")]
    pub score: Option<i64>,

    /// Weight in percent, as reported by the model.
    #[serde(default, deserialize_with = "lenient_int")]
    pub weight: Option<i64>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub feedback: String,
}

impl CategoryScore {
    pub fn dimension(&self) -> Option<RubricDimension> {
        RubricDimension::from_name(&self.name)
    }
}

/// Investment analysis parsed from the synthesis answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(default, deserialize_with = "lenient_recommendation")]
    pub recommendation: Option<Recommendation>,

    #[serde(default, deserialize_with = "lenient_int", alias = "overallScore")]
    pub overall_score: Option<i64>,

    #[serde(default, deserialize_with = "lenient_int", alias = "confidenceScore")]
    pub confidence_score: Option<i64>,

    #[serde(default, deserialize_with = "lenient_string_list")]
    pub strengths: Vec<String>,

    #[serde(default, deserialize_with = "lenient_string_list")]
    pub weaknesses: Vec<String>,

    #[serde(default, deserialize_with = "lenient_string", alias = "recommendationText")]
    pub recommendation_text: String,

    #[serde(default, deserialize_with = "lenient_categories")]
    pub categories: Vec<CategoryScore>,

    /// Set by the parser at parse time, never taken from the model.
    #[serde(default, deserialize_with = "lenient_string", alias = "processingDate")]
    pub processing_date: String,
}

impl AnalysisRecord {
    /// Rubric-weighted score on a 0–100 scale, from the category scores.
    ///
    /// Uses the fixed rubric weights, not the weights the model echoed back.
    /// Categories that do not map to a rubric dimension, or carry no score,
    /// contribute nothing. Only the first entry for a dimension counts, so
    /// the result never exceeds 100. Returns `None` when no category could
    /// be scored.
    pub fn weighted_score(&self) -> Option<f64> {
        let mut total = 0.0;
        let mut scored = false;
        let mut seen = HashSet::new();

        for category in &self.categories {
            let Some(dimension) = category.dimension() else {
                continue;
            };
            if !seen.insert(dimension) {
                continue;
            }
            let Some(score) = category.score else {
                continue;
            };
            let score = score.clamp(0, 10) as f64;
            total += score * f64::from(dimension.weight()) / 10.0;
            scored = true;
        }

        scored.then_some(total)
    }

    /// Find the rubric entry for a dimension.
    pub fn category(&self, dimension: RubricDimension) -> Option<&CategoryScore> {
        self.categories
            .iter()
            .find(|c| c.dimension() == Some(dimension))
    }
}

fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let trimmed = s.trim().trim_end_matches('%').trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(coerce_int(&value))
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(coerce_string(&value).unwrap_or_default())
}

fn lenient_string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Array(items) => items.iter().filter_map(coerce_string).collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

fn lenient_recommendation<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<Recommendation>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(Recommendation::from_label(&s)),
        _ => None,
    })
}

/// Accepts a list of entries, or an object keyed by category name.
fn lenient_categories<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<CategoryScore>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(name, item)| {
                let mut entry: CategoryScore = match item {
                    Value::Object(_) => serde_json::from_value(item).ok()?,
                    other => CategoryScore {
                        score: coerce_int(&other),
                        ..CategoryScore::default()
                    },
                };
                if entry.name.is_empty() {
                    entry.name = name;
                }
                Some(entry)
            })
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recommendation_from_label() {
        assert_eq!(Recommendation::from_label("Strong Buy"), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_label("strong_buy"), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_label("HOLD"), Recommendation::Hold);
        assert_eq!(Recommendation::from_label("Pass."), Recommendation::Pass);
        assert_eq!(
            Recommendation::from_label("Maybe"),
            Recommendation::Other("Maybe".to_string())
        );
    }

    #[test]
    fn test_full_record_deserializes() {
        let value = json!({
            "recommendation": "Hold",
            "overall_score": 64,
            "confidence_score": 70,
            "strengths": ["a", "b", "c"],
            "weaknesses": ["d", "e", "f"],
            "recommendation_text": "Wait for traction.",
            "categories": [
                {"name": "Market", "score": 8, "weight": 20, "feedback": "Large"}
            ],
            "processing_date": "2020-01-01"
        });
        let record: AnalysisRecord = serde_json::from_value(value).unwrap();

        assert_eq!(record.recommendation, Some(Recommendation::Hold));
        assert_eq!(record.overall_score, Some(64));
        assert_eq!(record.strengths.len(), 3);
        assert_eq!(record.categories[0].weight, Some(20));
        assert_eq!(record.categories[0].dimension(), Some(RubricDimension::Market));
    }

    #[test]
    fn test_missing_fields_default() {
        let record: AnalysisRecord = serde_json::from_value(json!({})).unwrap();
        assert_eq!(record.recommendation, None);
        assert_eq!(record.overall_score, None);
        assert!(record.strengths.is_empty());
        assert!(record.categories.is_empty());
    }

    #[test]
    fn test_odd_types_are_coerced() {
        let value = json!({
            "recommendation": 7,
            "overallScore": "85%",
            "confidence_score": 72.6,
            "strengths": "Only one strength",
            "weaknesses": ["x", 3, null],
            "categories": {
                "Team": {"score": "9", "feedback": "Strong founders"},
                "Clarity": 4
            }
        });
        let record: AnalysisRecord = serde_json::from_value(value).unwrap();

        assert_eq!(record.recommendation, None);
        assert_eq!(record.overall_score, Some(85));
        assert_eq!(record.confidence_score, Some(73));
        assert_eq!(record.strengths, vec!["Only one strength"]);
        assert_eq!(record.weaknesses, vec!["x", "3"]);

        let team = record.category(RubricDimension::Team).unwrap();
        assert_eq!(team.score, Some(9));
        assert_eq!(team.feedback, "Strong founders");
        assert_eq!(
            record.category(RubricDimension::Clarity).and_then(|c| c.score),
            Some(4)
        );
    }

    #[test]
    fn test_weighted_score_uses_fixed_weights() {
        let record = AnalysisRecord {
            categories: vec![
                CategoryScore {
                    name: "Market".into(),
                    score: Some(10),
                    // Wrong weight from the model must not matter.
                    weight: Some(90),
                    feedback: String::new(),
                },
                CategoryScore {
                    name: "Team".into(),
                    score: Some(5),
                    weight: Some(15),
                    feedback: String::new(),
                },
                CategoryScore {
                    name: "Vibes".into(),
                    score: Some(10),
                    weight: Some(50),
                    feedback: String::new(),
                },
            ],
            ..AnalysisRecord::default()
        };

        let score = record.weighted_score().unwrap();
        assert!((score - 27.5).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_score_counts_first_entry_per_dimension() {
        let mut categories: Vec<CategoryScore> = RubricDimension::ALL
            .iter()
            .map(|d| CategoryScore {
                name: d.name().into(),
                score: Some(10),
                weight: Some(i64::from(d.weight())),
                feedback: String::new(),
            })
            .collect();
        categories.push(CategoryScore {
            name: "market".into(),
            score: Some(10),
            weight: Some(20),
            feedback: String::new(),
        });
        let record = AnalysisRecord {
            categories,
            ..AnalysisRecord::default()
        };

        let score = record.weighted_score().unwrap();
        assert!((score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_score_none_without_categories() {
        assert_eq!(AnalysisRecord::default().weighted_score(), None);
    }

    #[test]
    fn test_recommendation_serializes_as_display_name() {
        let record = AnalysisRecord {
            recommendation: Some(Recommendation::StrongBuy),
            ..AnalysisRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["recommendation"], "Strong Buy");
    }
}
