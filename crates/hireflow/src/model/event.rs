//! Stage events and their status lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UnknownVariant;

/// Status of a single stage attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Passed,
    Failed,
}

impl EventStatus {
    pub const ALL: [EventStatus; 6] = [
        EventStatus::Pending,
        EventStatus::Scheduled,
        EventStatus::InProgress,
        EventStatus::Completed,
        EventStatus::Passed,
        EventStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Scheduled => "scheduled",
            EventStatus::InProgress => "in_progress",
            EventStatus::Completed => "completed",
            EventStatus::Passed => "passed",
            EventStatus::Failed => "failed",
        }
    }

    /// Terminal for display purposes.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventStatus::Passed | EventStatus::Completed | EventStatus::Failed
        )
    }

    /// Counts toward pipeline progress.
    pub fn is_success(&self) -> bool {
        matches!(self, EventStatus::Passed | EventStatus::Completed)
    }

    /// Statuses reachable from `self` in one step.
    ///
    /// `Completed` may still be reviewed into `Passed` or `Failed`;
    /// `Passed` and `Failed` are final.
    pub fn allowed_transitions(&self) -> &'static [EventStatus] {
        use EventStatus::*;
        match self {
            Pending => &[Scheduled, InProgress, Passed, Completed, Failed],
            Scheduled => &[Pending, Scheduled, InProgress, Passed, Completed, Failed],
            InProgress => &[Completed, Passed, Failed],
            Completed => &[Passed, Failed],
            Passed | Failed => &[],
        }
    }

    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EventStatus::Pending),
            "scheduled" => Ok(EventStatus::Scheduled),
            "in_progress" => Ok(EventStatus::InProgress),
            "completed" => Ok(EventStatus::Completed),
            "passed" => Ok(EventStatus::Passed),
            "failed" => Ok(EventStatus::Failed),
            other => Err(UnknownVariant::new("event status", other)),
        }
    }
}

/// One attempt of a candidate at a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageEvent {
    pub id: String,
    /// Pipeline candidate this event belongs to.
    pub candidate_id: String,
    pub stage_id: String,
    pub status: EventStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Last modification time; the relay reconciles on this.
    pub updated_at: DateTime<Utc>,
}

impl StageEvent {
    /// Creates a new event with a fresh id.
    pub fn new(candidate_id: &str, stage_id: &str, status: EventStatus, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            candidate_id: candidate_id.to_string(),
            stage_id: stage_id.to_string(),
            status,
            scheduled_at: None,
            completed_at: if status.is_terminal() { Some(now) } else { None },
            ai_score: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a status change, stamping `completed_at` on terminal statuses.
    pub fn set_status(&mut self, status: EventStatus, now: DateTime<Utc>) {
        self.status = status;
        if status.is_terminal() {
            self.completed_at = Some(now);
        } else {
            self.completed_at = None;
        }
        self.updated_at = now;
    }
}

/// Returns the active event for a stage: the most recently created one.
///
/// `events` must be ordered by creation time, oldest first.
pub fn active_event<'a>(events: &'a [StageEvent], stage_id: &str) -> Option<&'a StageEvent> {
    events.iter().rev().find(|e| e.stage_id == stage_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_statuses_have_no_transitions() {
        for next in EventStatus::ALL {
            assert!(!EventStatus::Passed.can_transition_to(next));
            assert!(!EventStatus::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_lifecycle_path_is_allowed() {
        assert!(EventStatus::Pending.can_transition_to(EventStatus::Scheduled));
        assert!(EventStatus::Scheduled.can_transition_to(EventStatus::InProgress));
        assert!(EventStatus::InProgress.can_transition_to(EventStatus::Passed));
        assert!(EventStatus::InProgress.can_transition_to(EventStatus::Failed));
    }

    #[test]
    fn test_in_progress_cannot_regress() {
        assert!(!EventStatus::InProgress.can_transition_to(EventStatus::Pending));
        assert!(!EventStatus::InProgress.can_transition_to(EventStatus::Scheduled));
        assert!(!EventStatus::Completed.can_transition_to(EventStatus::InProgress));
    }

    #[test]
    fn test_terminal_and_success_sets() {
        assert!(EventStatus::Completed.is_terminal());
        assert!(EventStatus::Failed.is_terminal());
        assert!(!EventStatus::Failed.is_success());
        assert!(!EventStatus::Scheduled.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "in_progress".parse::<EventStatus>().unwrap(),
            EventStatus::InProgress
        );
        assert!("done".parse::<EventStatus>().is_err());
    }

    #[test]
    fn test_set_status_stamps_completion() {
        let now = Utc::now();
        let mut event = StageEvent::new("c1", "s1", EventStatus::Pending, now);
        assert!(event.completed_at.is_none());

        event.set_status(EventStatus::Passed, now);
        assert_eq!(event.completed_at, Some(now));
    }

    #[test]
    fn test_active_event_is_latest_for_stage() {
        let now = Utc::now();
        let first = StageEvent::new("c1", "s1", EventStatus::Failed, now);
        let other = StageEvent::new("c1", "s2", EventStatus::Pending, now);
        let retry = StageEvent::new("c1", "s1", EventStatus::Pending, now);
        let events = vec![first, other, retry.clone()];

        assert_eq!(active_event(&events, "s1").unwrap().id, retry.id);
        assert!(active_event(&events, "s3").is_none());
    }
}
