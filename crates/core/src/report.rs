//! Report rendering for finished analyses.
//!
//! The pipeline only depends on [`ReportRenderer`]; the renderers here produce
//! Markdown and JSON documents. A PDF writer would plug in the same way.

use crate::record::AnalysisRecord;
use crate::rubric::RubricDimension;
use crate::{Error, Result};

/// A rendered report ready to be written or downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    /// Suggested filename, without directory.
    pub filename: String,
}

/// Turns an analysis into a downloadable document.
pub trait ReportRenderer {
    fn render(&self, record: &AnalysisRecord, startup_name: Option<&str>) -> Result<RenderedReport>;
}

/// Build `<Startup_Name>_Investment_Thesis.<ext>` from a free-form name.
pub fn report_filename(startup_name: Option<&str>, extension: &str) -> String {
    let stem = startup_name
        .map(|name| {
            name.split(|c: char| !c.is_alphanumeric())
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join("_")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Startup".to_string());

    format!("{}_Investment_Thesis.{}", stem, extension)
}

/// Markdown report renderer.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    /// Whether to include per-category feedback under the score table.
    include_feedback: bool,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self {
            include_feedback: true,
        }
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feedback(mut self, include: bool) -> Self {
        self.include_feedback = include;
        self
    }

    /// Render the report body as Markdown text.
    pub fn format(&self, record: &AnalysisRecord, startup_name: Option<&str>) -> String {
        let mut out = String::new();
        let title = startup_name.unwrap_or("Startup");

        out.push_str(&format!("# Investment Thesis: {}\n\n", title));

        let recommendation = record
            .recommendation
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "Not given".to_string());
        out.push_str(&format!("**Recommendation:** {}\n\n", recommendation));
        out.push_str(&format!(
            "**Overall score:** {}\n\n",
            score_or_dash(record.overall_score, 100)
        ));
        if let Some(weighted) = record.weighted_score() {
            out.push_str(&format!("**Rubric-weighted score:** {:.1}/100\n\n", weighted));
        }
        out.push_str(&format!(
            "**Confidence:** {}\n\n",
            score_or_dash(record.confidence_score, 100)
        ));

        push_list(&mut out, "Strengths", &record.strengths);
        push_list(&mut out, "Weaknesses", &record.weaknesses);

        if !record.categories.is_empty() {
            out.push_str("## Category Scores\n\n");
            out.push_str("| Category | Score | Weight |\n");
            out.push_str("|---|---|---|\n");
            for category in &record.categories {
                let weight = category
                    .dimension()
                    .map(RubricDimension::weight)
                    .map(|w| format!("{}%", w))
                    .unwrap_or_else(|| "-".to_string());
                out.push_str(&format!(
                    "| {} | {} | {} |\n",
                    category.name,
                    score_or_dash(category.score, 10),
                    weight
                ));
            }
            out.push('\n');

            if self.include_feedback {
                for category in record.categories.iter().filter(|c| !c.feedback.is_empty()) {
                    out.push_str(&format!("**{}:** {}\n\n", category.name, category.feedback));
                }
            }
        }

        if !record.recommendation_text.trim().is_empty() {
            out.push_str("## Recommendation\n\n");
            out.push_str(record.recommendation_text.trim());
            out.push_str("\n\n");
        }

        out.push_str(&format!("_Processed: {}_\n", record.processing_date));
        out
    }
}

impl ReportRenderer for MarkdownRenderer {
    fn render(&self, record: &AnalysisRecord, startup_name: Option<&str>) -> Result<RenderedReport> {
        Ok(RenderedReport {
            bytes: self.format(record, startup_name).into_bytes(),
            filename: report_filename(startup_name, "md"),
        })
    }
}

/// Pretty-printed JSON report renderer.
#[derive(Debug, Clone, Default)]
pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn render(&self, record: &AnalysisRecord, startup_name: Option<&str>) -> Result<RenderedReport> {
        let bytes = serde_json::to_vec_pretty(record)
            .map_err(|e| Error::Format(format!("Failed to serialize analysis: {}", e)))?;
        Ok(RenderedReport {
            bytes,
            filename: report_filename(startup_name, "json"),
        })
    }
}

fn score_or_dash(score: Option<i64>, out_of: i64) -> String {
    match score {
        Some(s) => format!("{}/{}", s, out_of),
        None => "-".to_string(),
    }
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("## {}\n\n", heading));
    for item in items {
        out.push_str(&format!("- {}\n", item));
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CategoryScore, Recommendation};

    fn sample_record() -> AnalysisRecord {
        AnalysisRecord {
            recommendation: Some(Recommendation::Hold),
            overall_score: Some(64),
            confidence_score: Some(70),
            strengths: vec!["Clear problem".into(), "Strong team".into()],
            weaknesses: vec!["No revenue".into()],
            recommendation_text: "Revisit after the seed round.".into(),
            categories: vec![CategoryScore {
                name: "Market".into(),
                score: Some(8),
                weight: Some(20),
                feedback: "Large and growing".into(),
            }],
            processing_date: "2024-03-09 14:05:00 UTC".into(),
        }
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(
            report_filename(Some("Acme Robotics, Inc."), "md"),
            "Acme_Robotics_Inc_Investment_Thesis.md"
        );
        assert_eq!(report_filename(None, "json"), "Startup_Investment_Thesis.json");
        assert_eq!(report_filename(Some("  !! "), "md"), "Startup_Investment_Thesis.md");
    }

    #[test]
    fn test_markdown_sections() {
        let text = MarkdownRenderer::new().format(&sample_record(), Some("Acme"));

        assert!(text.starts_with("# Investment Thesis: Acme\n"));
        assert!(text.contains("**Recommendation:** Hold"));
        assert!(text.contains("**Overall score:** 64/100"));
        assert!(text.contains("**Rubric-weighted score:** 16.0/100"));
        assert!(text.contains("- Strong team\n"));
        assert!(text.contains("| Market | 8/10 | 20% |"));
        assert!(text.contains("**Market:** Large and growing"));
        assert!(text.contains("Revisit after the seed round."));
        assert!(text.ends_with("_Processed: 2024-03-09 14:05:00 UTC_\n"));
    }

    #[test]
    fn test_markdown_without_feedback() {
        let text = MarkdownRenderer::new()
            .with_feedback(false)
            .format(&sample_record(), None);
        assert!(!text.contains("Large and growing"));
        assert!(text.starts_with("# Investment Thesis: Startup\n"));
    }

    #[test]
    fn test_markdown_handles_sparse_record() {
        let text = MarkdownRenderer::new().format(&AnalysisRecord::default(), None);
        assert!(text.contains("**Recommendation:** Not given"));
        assert!(text.contains("**Overall score:** -"));
        assert!(!text.contains("## Strengths"));
        assert!(!text.contains("Rubric-weighted"));
    }

    #[test]
    fn test_render_markdown() {
        let report = MarkdownRenderer::new()
            .render(&sample_record(), Some("Acme"))
            .unwrap();
        assert_eq!(report.filename, "Acme_Investment_Thesis.md");
        assert!(!report.bytes.is_empty());
    }

    #[test]
    fn test_render_json() {
        let report = JsonRenderer.render(&sample_record(), Some("Acme")).unwrap();
        assert_eq!(report.filename, "Acme_Investment_Thesis.json");

        let value: serde_json::Value = serde_json::from_slice(&report.bytes).unwrap();
        assert_eq!(value["recommendation"], "Hold");
        assert_eq!(value["categories"][0]["score"], 8);
    }
}
