//! Aggregate thesis synthesis: one prompt for the whole deck, one model call,
//! one parsed analysis.

use crate::client::{CompletionRequest, ModelClient, DEFAULT_MAX_TOKENS};
use chrono::{DateTime, Utc};
use thesis_core::rubric::rubric_lines;
use thesis_core::validate::enforce;
use thesis_core::{
    parse_analysis_at, AnalysisRecord, ClassifiedDeck, PitchCategory, Result, RubricDimension,
    SchemaIssue, ValidationMode,
};

const PROMPT_HEADER: &str = "You are a venture capital analyst. Evaluate the startup pitch deck \
content below and write an investment analysis.";

/// Group slide text by category, in the order categories first appear.
///
/// Unclassified slides are dropped. Texts within a category keep slide order.
pub fn group_by_category(deck: &ClassifiedDeck) -> Vec<(PitchCategory, Vec<&str>)> {
    let mut groups: Vec<(PitchCategory, Vec<&str>)> = Vec::new();

    for (category, slide) in deck.categorized() {
        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, texts)) => texts.push(&slide.raw_text),
            None => groups.push((category, vec![slide.raw_text.as_str()])),
        }
    }

    groups
}

fn schema_example() -> String {
    let categories = RubricDimension::ALL
        .iter()
        .map(|d| {
            format!(
                "    {{\"name\": \"{}\", \"score\": <integer 0-10>, \"weight\": {}, \"feedback\": \"<one or two sentences>\"}}",
                d.name(),
                d.weight()
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "{{\n  \"recommendation\": \"Strong Buy\" | \"Hold\" | \"Pass\",\n  \
         \"overall_score\": <integer 0-100>,\n  \
         \"confidence_score\": <integer 0-100>,\n  \
         \"strengths\": [<3 to 5 short strings>],\n  \
         \"weaknesses\": [<3 to 5 short strings>],\n  \
         \"recommendation_text\": \"<one paragraph justifying the recommendation>\",\n  \
         \"categories\": [\n{}\n  ],\n  \
         \"processing_date\": \"<current date and time>\"\n}}",
        categories
    )
}

/// Build the aggregate analysis prompt for a classified deck.
pub fn build_prompt(deck: &ClassifiedDeck) -> String {
    let mut prompt = String::new();

    prompt.push_str(PROMPT_HEADER);
    prompt.push_str("\n\nScore each category from 0 to 10. Use exactly these weights:\n");
    prompt.push_str(&rubric_lines());
    prompt.push_str(
        "\n\nRespond with a single JSON object and nothing else, using exactly this structure:\n",
    );
    prompt.push_str(&schema_example());
    prompt.push_str("\n\nPitch deck content by section:\n");

    for (category, texts) in group_by_category(deck) {
        prompt.push_str(&format!("\n### {}\n{}\n", category.name(), texts.join("\n")));
    }

    prompt
}

/// The parsed analysis and any schema problems found in it.
#[derive(Debug, Clone)]
pub struct ParsedAnalysis {
    pub record: AnalysisRecord,
    pub issues: Vec<SchemaIssue>,
}

/// Drives the synthesis call and parses its answer.
pub struct ThesisSynthesizer<C> {
    client: C,
    max_tokens: u32,
    mode: ValidationMode,
}

impl<C: ModelClient> ThesisSynthesizer<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            max_tokens: DEFAULT_MAX_TOKENS,
            mode: ValidationMode::default(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Send the prompt and return the raw answer.
    pub fn synthesize(&self, prompt: &str) -> Result<String> {
        log::info!("Requesting thesis synthesis ({} prompt chars)", prompt.len());
        let request = CompletionRequest::new(prompt, self.max_tokens);
        Ok(self.client.complete(&request)?)
    }

    /// Parse a raw answer into a record stamped with the current time.
    pub fn parse(&self, raw: &str) -> Result<AnalysisRecord> {
        Ok(self.parse_at(raw, Utc::now())?.record)
    }

    /// Parse a raw answer, validating it under the configured mode.
    pub fn parse_at(&self, raw: &str, now: DateTime<Utc>) -> Result<ParsedAnalysis> {
        let record = parse_analysis_at(raw, now)?;
        let issues = enforce(&record, self.mode)?;
        Ok(ParsedAnalysis { record, issues })
    }

    /// Build the prompt, call the model once, and parse the answer.
    pub fn run(&self, deck: &ClassifiedDeck) -> Result<ParsedAnalysis> {
        let prompt = build_prompt(deck);
        let raw = self.synthesize(&prompt)?;
        self.parse_at(&raw, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ModelError;
    use crate::testing::{complete_analysis_json, ScriptedClient};
    use chrono::TimeZone;
    use thesis_core::{Error, Recommendation, Slide, SlideLabel};

    fn deck(entries: &[(SlideLabel, &str)]) -> ClassifiedDeck {
        ClassifiedDeck::new(
            entries
                .iter()
                .enumerate()
                .map(|(i, (label, text))| Slide::new(i + 1, *text).classify(*label))
                .collect(),
        )
    }

    #[test]
    fn test_grouping_keeps_first_seen_order() {
        let d = deck(&[
            (PitchCategory::Market.into(), "TAM is $4B"),
            (PitchCategory::Problem.into(), "Invoices are slow"),
            (PitchCategory::Market.into(), "Growing 20% a year"),
        ]);

        let groups = group_by_category(&d);
        assert_eq!(
            groups,
            vec![
                (PitchCategory::Market, vec!["TAM is $4B", "Growing 20% a year"]),
                (PitchCategory::Problem, vec!["Invoices are slow"]),
            ]
        );
    }

    #[test]
    fn test_prompt_sections_in_first_seen_order() {
        let d = deck(&[
            (PitchCategory::Market.into(), "TAM is $4B"),
            (PitchCategory::Problem.into(), "Invoices are slow"),
            (PitchCategory::Market.into(), "Growing 20% a year"),
        ]);
        let prompt = build_prompt(&d);

        let market = prompt.find("### Market").unwrap();
        let problem = prompt.find("### Problem").unwrap();
        assert!(market < problem);
        assert!(prompt.contains("### Market\nTAM is $4B\nGrowing 20% a year\n"));
    }

    #[test]
    fn test_prompt_drops_unclassified() {
        let d = deck(&[
            (SlideLabel::Unclassified, "Thank you!"),
            (PitchCategory::Team.into(), "Ex-Stripe founders"),
        ]);
        let prompt = build_prompt(&d);

        assert!(!prompt.contains("Thank you!"));
        assert!(!prompt.contains("### Unclassified"));
        assert!(prompt.contains("### Team\nEx-Stripe founders"));
    }

    #[test]
    fn test_prompt_states_rubric_and_schema() {
        let prompt = build_prompt(&ClassifiedDeck::default());

        assert!(prompt.contains("- Market: 20%"));
        assert!(prompt.contains("- Clarity: 5%"));
        assert!(prompt.contains("\"recommendation_text\""));
        assert!(prompt.contains("{\"name\": \"Business Model\", \"score\": <integer 0-10>, \"weight\": 15"));
        assert!(prompt.contains("\"processing_date\""));
    }

    #[test]
    fn test_synthesize_uses_larger_budget() {
        let client = ScriptedClient::new(vec![Ok("{}".into())]);
        let synthesizer = ThesisSynthesizer::new(&client);
        synthesizer.synthesize("prompt").unwrap();

        assert_eq!(client.requests()[0].max_tokens, DEFAULT_MAX_TOKENS);
        assert!(DEFAULT_MAX_TOKENS > crate::classifier::CLASSIFY_MAX_TOKENS);
    }

    #[test]
    fn test_synthesize_surfaces_api_error() {
        let client = ScriptedClient::new(vec![Err(ModelError::Api {
            status: 503,
            body: "unavailable".into(),
        })]);
        let err = ThesisSynthesizer::new(&client).synthesize("p").unwrap_err();
        assert!(matches!(err, Error::ModelApi { status: 503, .. }));
    }

    #[test]
    fn test_parse_overrides_model_timestamp() {
        let client = ScriptedClient::new(vec![]);
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let raw = r#"Sure! ```json
{"recommendation": "Pass", "processing_date": "2019-01-01"}
```"#;

        let parsed = ThesisSynthesizer::new(&client).parse_at(raw, now).unwrap();
        assert_eq!(parsed.record.recommendation, Some(Recommendation::Pass));
        assert_eq!(parsed.record.processing_date, "2025-01-02 03:04:05 UTC");
        assert!(!parsed.issues.is_empty());
    }

    #[test]
    fn test_strict_mode_rejects_incomplete_analysis() {
        let client = ScriptedClient::new(vec![]);
        let err = ThesisSynthesizer::new(&client)
            .with_validation_mode(ValidationMode::Strict)
            .parse(r#"{"recommendation": "Hold"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_run_accepts_complete_analysis_in_strict_mode() {
        let client = ScriptedClient::new(vec![Ok(format!(
            "Here is my analysis:\n```json\n{}\n```",
            complete_analysis_json()
        ))]);
        let d = deck(&[(PitchCategory::Team.into(), "Founders")]);

        let parsed = ThesisSynthesizer::new(&client)
            .with_validation_mode(ValidationMode::Strict)
            .run(&d)
            .unwrap();

        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.record.recommendation, Some(Recommendation::StrongBuy));
        assert_eq!(client.calls(), 1);
        assert!(client.requests()[0].prompt.contains("### Team\nFounders"));
    }

    #[test]
    fn test_run_fails_on_refusal() {
        let client = ScriptedClient::new(vec![Ok("I cannot provide investment advice.".into())]);
        let d = deck(&[(PitchCategory::Team.into(), "Founders")]);

        let err = ThesisSynthesizer::new(&client).run(&d).unwrap_err();
        assert!(matches!(err, Error::MalformedOutput { .. }));
    }
}
