use std::fmt;

use thiserror::Error;

use crate::model::EventStatus;
use crate::notify::DispatchError;
use crate::scoring::ScoringError;
use crate::store::StoreError;

use super::outcome::ScheduleOutcome;

/// One step of the candidate removal cascade, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalStep {
    Responses,
    Events,
    Candidate,
}

impl fmt::Display for RemovalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalStep::Responses => write!(f, "delete responses"),
            RemovalStep::Events => write!(f, "delete events"),
            RemovalStep::Candidate => write!(f, "delete candidate"),
        }
    }
}

fn join_steps(steps: &[RemovalStep]) -> String {
    steps
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Cannot change event status from {from} to {to}")]
    InvalidTransition { from: EventStatus, to: EventStatus },

    /// Another writer got there first; nothing was written.
    #[error("{entity} '{id}' changed concurrently, retry the operation")]
    Conflict { entity: &'static str, id: String },

    /// The schedule was committed but the notice could not be delivered.
    #[error("Stage scheduled but notification failed: {source}")]
    DispatchFailure {
        outcome: Box<ScheduleOutcome>,
        #[source]
        source: DispatchError,
    },

    #[error(
        "Removal of candidate '{candidate_id}' stopped at '{failed_step}' after [{}]: {source}",
        join_steps(.completed)
    )]
    CascadeFailure {
        candidate_id: String,
        completed: Vec<RemovalStep>,
        failed_step: RemovalStep,
        #[source]
        source: StoreError,
    },

    #[error("Bulk move failed for {} of {} candidates", .failed.len(), .failed.len() + .succeeded.len())]
    PartialBulkFailure {
        failed: Vec<String>,
        succeeded: Vec<String>,
    },

    #[error("Scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl PipelineError {
    pub(crate) fn not_found(entity: &'static str, id: &str) -> Self {
        PipelineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        PipelineError::Validation {
            message: message.into(),
        }
    }

    /// Whether some of the requested work was committed before the failure.
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            PipelineError::DispatchFailure { .. }
                | PipelineError::CascadeFailure { .. }
                | PipelineError::PartialBulkFailure { .. }
        )
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { entity, id } => PipelineError::Conflict { entity, id },
            other => PipelineError::Store(other),
        }
    }
}
