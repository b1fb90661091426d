//! The fixed scoring rubric used by the synthesis prompt.

use crate::normalize::fold_label;
use std::fmt;

/// One scored dimension of the investment rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RubricDimension {
    Problem,
    Solution,
    Market,
    BusinessModel,
    Competition,
    Team,
    Traction,
    Financials,
    Clarity,
}

impl RubricDimension {
    /// All dimensions, in rubric order.
    pub const ALL: [RubricDimension; 9] = [
        Self::Problem,
        Self::Solution,
        Self::Market,
        Self::BusinessModel,
        Self::Competition,
        Self::Team,
        Self::Traction,
        Self::Financials,
        Self::Clarity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Problem => "Problem",
            Self::Solution => "Solution",
            Self::Market => "Market",
            Self::BusinessModel => "Business Model",
            Self::Competition => "Competition",
            Self::Team => "Team",
            Self::Traction => "Traction",
            Self::Financials => "Financials",
            Self::Clarity => "Clarity",
        }
    }

    /// Fixed weight in percent. Weights sum to 100.
    pub fn weight(self) -> u32 {
        match self {
            Self::Problem => 10,
            Self::Solution => 15,
            Self::Market => 20,
            Self::BusinessModel => 15,
            Self::Competition => 10,
            Self::Team => 15,
            Self::Traction => 10,
            Self::Financials => 10,
            Self::Clarity => 5,
        }
    }

    /// Look up a dimension by the name a model used for it.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = fold_label(name);
        match key.as_str() {
            "problem" => Some(Self::Problem),
            "solution" | "product" | "solution product" => Some(Self::Solution),
            "market" => Some(Self::Market),
            "business model" | "businessmodel" => Some(Self::BusinessModel),
            "competition" => Some(Self::Competition),
            "team" => Some(Self::Team),
            "traction" => Some(Self::Traction),
            "financials" | "financial" => Some(Self::Financials),
            "clarity" | "clarity of presentation" | "presentation clarity" => Some(Self::Clarity),
            _ => None,
        }
    }
}

impl fmt::Display for RubricDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Render the rubric as prompt lines, e.g. `- Market: 20%`.
pub fn rubric_lines() -> String {
    RubricDimension::ALL
        .iter()
        .map(|d| format!("- {}: {}%", d.name(), d.weight()))
        .collect::<Vec<_>>()
        .join("\n")
}
