//! AI scoring collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input handed to the scoring service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub candidate_id: String,
    pub candidate_ref: String,
    pub job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_ref: Option<String>,
}

/// Score in 0..=100 plus an opaque analysis payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: f64,
    #[serde(default)]
    pub analysis: serde_json::Value,
}

impl ScoreReport {
    pub fn new(score: f64, analysis: serde_json::Value) -> Self {
        Self { score, analysis }
    }

    pub fn is_in_range(&self) -> bool {
        (0.0..=100.0).contains(&self.score)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("Scoring service unavailable: {0}")]
    Unavailable(String),

    #[error("Scoring service returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Scoring gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

impl ScoringError {
    /// Only an unreachable service is worth calling again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScoringError::Unavailable(_))
    }
}

/// Scores a candidate against a job. Calls are safe to repeat.
#[async_trait]
pub trait CandidateScorer: Send + Sync {
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreReport, ScoringError>;
}
