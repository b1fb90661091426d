//! Test doubles for the model client.

use crate::client::{CompletionRequest, ModelClient, ModelError};
use std::cell::RefCell;
use std::collections::VecDeque;
use thesis_core::RubricDimension;

/// A model client that replays canned answers in order and records requests.
pub(crate) struct ScriptedClient {
    responses: RefCell<VecDeque<Result<String, ModelError>>>,
    requests: RefCell<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new(responses: Vec<Result<String, ModelError>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.borrow().clone()
    }
}

impl ModelClient for ScriptedClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Transport("no scripted response left".into())))
    }
}

/// A synthesis answer that passes strict validation.
pub(crate) fn complete_analysis_json() -> String {
    let categories: Vec<serde_json::Value> = RubricDimension::ALL
        .iter()
        .map(|d| {
            serde_json::json!({
                "name": d.name(),
                "score": 7,
                "weight": d.weight(),
                "feedback": format!("{} looks solid", d.name()),
            })
        })
        .collect();

    serde_json::json!({
        "recommendation": "Strong Buy",
        "overall_score": 78,
        "confidence_score": 66,
        "strengths": ["Large market", "Experienced team", "Clear problem"],
        "weaknesses": ["Early revenue", "Crowded space", "Capital intensive"],
        "recommendation_text": "Invest in the seed round.",
        "categories": categories,
        "processing_date": "2000-01-01 00:00:00 UTC",
    })
    .to_string()
}
