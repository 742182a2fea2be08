use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UnknownVariant;

/// Overall status of a candidate within a job's pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Active,
    Shortlisted,
    Hired,
    Rejected,
    PendingConfirmation,
    InterviewComplete,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Active => "active",
            CandidateStatus::Shortlisted => "shortlisted",
            CandidateStatus::Hired => "hired",
            CandidateStatus::Rejected => "rejected",
            CandidateStatus::PendingConfirmation => "pending_confirmation",
            CandidateStatus::InterviewComplete => "interview_complete",
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CandidateStatus::Active),
            "shortlisted" => Ok(CandidateStatus::Shortlisted),
            "hired" => Ok(CandidateStatus::Hired),
            "rejected" => Ok(CandidateStatus::Rejected),
            "pending_confirmation" => Ok(CandidateStatus::PendingConfirmation),
            "interview_complete" => Ok(CandidateStatus::InterviewComplete),
            other => Err(UnknownVariant::new("candidate status", other)),
        }
    }
}

/// A candidate's participation in one job's pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineCandidate {
    /// Identifier of this pipeline participation.
    pub id: String,
    /// Reference to the candidate profile.
    pub candidate_ref: String,
    /// Job the candidate applied to.
    pub job_id: String,
    /// Stage the candidate is currently positioned at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage_id: Option<String>,
    pub status: CandidateStatus,
    /// AI score in the range 0..=100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_score: Option<f64>,
    /// Opaque analysis payload returned by the scoring service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<serde_json::Value>,
    /// Resume file reference handed to the scoring service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_ref: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented on every committed update.
    pub version: i64,
}

impl PipelineCandidate {
    /// Creates a freshly applied candidate with no current stage.
    pub fn applied(id: &str, candidate_ref: &str, job_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            candidate_ref: candidate_ref.to_string(),
            job_id: job_id.to_string(),
            current_stage_id: None,
            status: CandidateStatus::Active,
            ai_score: None,
            ai_analysis: None,
            resume_ref: None,
            applied_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn is_at(&self, stage_id: &str) -> bool {
        self.current_stage_id.as_deref() == Some(stage_id)
    }
}
