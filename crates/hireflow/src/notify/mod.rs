//! Notification dispatch for scheduled stages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// What attendees are told when a stage is scheduled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageNotice {
    pub candidate_id: String,
    pub stage_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub meeting_link: String,
    /// Invitation token the candidate uses to join.
    pub invitation_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_url: Option<String>,
    pub attendees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Notification rejected: {reason}")]
    Rejected { reason: String },

    #[error("Notification transport failed: {0}")]
    Transport(String),
}

/// Delivers stage notices. Failure never undoes the scheduling it reports.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notice: &StageNotice) -> Result<(), DispatchError>;
}

/// Writes notices to the log instead of sending them.
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, notice: &StageNotice) -> Result<(), DispatchError> {
        tracing::info!(
            candidate_id = %notice.candidate_id,
            stage = %notice.stage_name,
            scheduled_at = %notice.scheduled_at,
            attendees = notice.attendees.len(),
            "Stage notice dispatched"
        );
        Ok(())
    }
}

/// Drops every notice.
pub struct NoopDispatcher;

#[async_trait]
impl NotificationDispatcher for NoopDispatcher {
    async fn dispatch(&self, _notice: &StageNotice) -> Result<(), DispatchError> {
        Ok(())
    }
}
