//! Conversions between repository rows and domain records.

use crate::db::candidate_repo::CandidateRow;
use crate::db::event_repo::EventRow;
use crate::db::invitation_repo::InvitationRow;
use crate::db::response_repo::ResponseRow;
use crate::db::stage_repo::StageRow;
use crate::db::{format_timestamp, parse_timestamp};
use crate::model::{
    CandidateStatus, DeliveryStatus, EventStatus, Invitation, PipelineCandidate, ResponseRecord,
    Stage, StageEvent,
};

use super::StoreError;

fn parse_optional(
    value: Option<&str>,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, StoreError> {
    value
        .map(parse_timestamp)
        .transpose()
        .map_err(StoreError::from)
}

impl From<&Stage> for StageRow {
    fn from(stage: &Stage) -> Self {
        Self {
            id: stage.id.clone(),
            job_id: stage.job_id.clone(),
            name: stage.name.clone(),
            stage_order: stage.stage_order,
            is_ai_automated: stage.is_ai_automated,
        }
    }
}

impl From<StageRow> for Stage {
    fn from(row: StageRow) -> Self {
        Self {
            id: row.id,
            job_id: row.job_id,
            name: row.name,
            stage_order: row.stage_order,
            is_ai_automated: row.is_ai_automated,
        }
    }
}

impl TryFrom<&PipelineCandidate> for CandidateRow {
    type Error = StoreError;

    fn try_from(c: &PipelineCandidate) -> Result<Self, Self::Error> {
        let ai_analysis = c
            .ai_analysis
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::corrupt("candidate", &c.id, e))?;
        Ok(Self {
            id: c.id.clone(),
            candidate_ref: c.candidate_ref.clone(),
            job_id: c.job_id.clone(),
            current_stage_id: c.current_stage_id.clone(),
            status: c.status.as_str().to_string(),
            ai_score: c.ai_score,
            ai_analysis,
            resume_ref: c.resume_ref.clone(),
            applied_at: format_timestamp(c.applied_at),
            updated_at: format_timestamp(c.updated_at),
            version: c.version,
        })
    }
}

impl TryFrom<CandidateRow> for PipelineCandidate {
    type Error = StoreError;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        let status: CandidateStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::corrupt("candidate", &row.id, e))?;
        let ai_analysis = row
            .ai_analysis
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .map_err(|e| StoreError::corrupt("candidate", &row.id, e))?;
        Ok(Self {
            applied_at: parse_timestamp(&row.applied_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
            candidate_ref: row.candidate_ref,
            job_id: row.job_id,
            current_stage_id: row.current_stage_id,
            status,
            ai_score: row.ai_score,
            ai_analysis,
            resume_ref: row.resume_ref,
            version: row.version,
        })
    }
}

impl From<&StageEvent> for EventRow {
    fn from(e: &StageEvent) -> Self {
        Self {
            id: e.id.clone(),
            candidate_id: e.candidate_id.clone(),
            stage_id: e.stage_id.clone(),
            status: e.status.as_str().to_string(),
            scheduled_at: e.scheduled_at.map(format_timestamp),
            completed_at: e.completed_at.map(format_timestamp),
            ai_score: e.ai_score,
            notes: e.notes.clone(),
            created_at: format_timestamp(e.created_at),
            updated_at: format_timestamp(e.updated_at),
        }
    }
}

impl TryFrom<EventRow> for StageEvent {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status: EventStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::corrupt("stage event", &row.id, e))?;
        Ok(Self {
            scheduled_at: parse_optional(row.scheduled_at.as_deref())?,
            completed_at: parse_optional(row.completed_at.as_deref())?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
            candidate_id: row.candidate_id,
            stage_id: row.stage_id,
            status,
            ai_score: row.ai_score,
            notes: row.notes,
        })
    }
}

impl From<&Invitation> for InvitationRow {
    fn from(i: &Invitation) -> Self {
        Self {
            id: i.id.clone(),
            event_id: i.event_id.clone(),
            token: i.token.clone(),
            meeting_link: i.meeting_link.clone(),
            expires_at: format_timestamp(i.expires_at),
            delivery_status: i.delivery_status.as_str().to_string(),
            created_at: format_timestamp(i.created_at),
        }
    }
}

impl TryFrom<InvitationRow> for Invitation {
    type Error = StoreError;

    fn try_from(row: InvitationRow) -> Result<Self, Self::Error> {
        let delivery_status: DeliveryStatus = row
            .delivery_status
            .parse()
            .map_err(|e| StoreError::corrupt("invitation", &row.id, e))?;
        Ok(Self {
            expires_at: parse_timestamp(&row.expires_at)?,
            created_at: parse_timestamp(&row.created_at)?,
            id: row.id,
            event_id: row.event_id,
            token: row.token,
            meeting_link: row.meeting_link,
            delivery_status,
        })
    }
}

impl From<&ResponseRecord> for ResponseRow {
    fn from(r: &ResponseRecord) -> Self {
        Self {
            id: r.id.clone(),
            event_id: r.event_id.clone(),
            question: r.question.clone(),
            answer: r.answer.clone(),
            created_at: format_timestamp(r.created_at),
        }
    }
}

impl TryFrom<ResponseRow> for ResponseRecord {
    type Error = StoreError;

    fn try_from(row: ResponseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: parse_timestamp(&row.created_at)?,
            id: row.id,
            event_id: row.event_id,
            question: row.question,
            answer: row.answer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_candidate_analysis_survives_row_conversion() {
        let mut candidate = PipelineCandidate::applied("c1", "profile-1", "job-1");
        candidate.status = CandidateStatus::Shortlisted;
        candidate.ai_analysis = Some(serde_json::json!({ "strengths": ["rust"] }));

        let row = CandidateRow::try_from(&candidate).unwrap();
        assert_eq!(row.status, "shortlisted");

        let back = PipelineCandidate::try_from(row).unwrap();
        assert_eq!(back.ai_analysis, candidate.ai_analysis);
        assert_eq!(back.status, CandidateStatus::Shortlisted);
    }

    #[test]
    fn test_unknown_status_is_corrupt() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut row = EventRow::from(&StageEvent::new("c1", "s1", EventStatus::Pending, now));
        row.status = "archived".to_string();

        assert!(matches!(
            StageEvent::try_from(row),
            Err(StoreError::Corrupt { entity: "stage event", .. })
        ));
    }

    #[test]
    fn test_event_timestamps_keep_microseconds() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::microseconds(42);
        let mut event = StageEvent::new("c1", "s1", EventStatus::Scheduled, now);
        event.scheduled_at = Some(now + Duration::days(2));

        let back = StageEvent::try_from(EventRow::from(&event)).unwrap();
        assert_eq!(back, event);
    }
}
