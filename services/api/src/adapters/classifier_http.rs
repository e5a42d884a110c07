//! services/api/src/adapters/classifier_http.rs
//!
//! This module contains the adapter for a hosted text-classification model.
//! It implements the `TextClassificationService` port from the `core` crate.

use async_trait::async_trait;
use serde::Deserialize;
use shopping_list_core::ports::{LabelScore, PortError, PortResult, TextClassificationService};
use tracing::{debug, error};

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize, Debug)]
struct RawLabel {
    label: String,
    score: f64,
}

/// The shapes the supported endpoints answer with.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ClassifierResponse {
    /// `[{label, score}, ...]`
    Ranked(Vec<RawLabel>),
    /// `[[{label, score}, ...]]`, one inner list per input.
    Batched(Vec<Vec<RawLabel>>),
    /// `{error}` from a failing function.
    Error { error: String },
    /// `{category, confidence?}` from the hosted categorize function.
    Single {
        category: String,
        confidence: Option<f64>,
    },
}

impl ClassifierResponse {
    fn into_scores(self) -> PortResult<Vec<LabelScore>> {
        let to_scores = |raw: Vec<RawLabel>| {
            raw.into_iter()
                .map(|r| LabelScore {
                    label: r.label,
                    score: r.score,
                })
                .collect()
        };
        match self {
            ClassifierResponse::Ranked(raw) => Ok(to_scores(raw)),
            ClassifierResponse::Batched(batches) => {
                Ok(to_scores(batches.into_iter().next().unwrap_or_default()))
            }
            ClassifierResponse::Single {
                category,
                confidence,
            } => Ok(vec![LabelScore {
                label: category,
                score: confidence.unwrap_or(1.0),
            }]),
            ClassifierResponse::Error { error } => Err(PortError::Unexpected(error)),
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Posts `{ "inputs": text }` with a bearer token to a model endpoint.
#[derive(Clone)]
pub struct HttpClassifierAdapter {
    client: reqwest::Client,
    url: String,
}

impl HttpClassifierAdapter {
    /// Creates a new `HttpClassifierAdapter`. No timeout is configured beyond
    /// the transport defaults.
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

//=========================================================================================
// `TextClassificationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextClassificationService for HttpClassifierAdapter {
    async fn classify_text(&self, text: &str, token: &str) -> PortResult<Vec<LabelScore>> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "inputs": text }))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(PortError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Classifier API error");
            return Err(PortError::Unexpected(format!("API error: {}", status)));
        }

        let parsed: ClassifierResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Unexpected response format: {}", e)))?;
        debug!(?parsed, "Classifier response");
        parsed.into_scores()
    }
}
