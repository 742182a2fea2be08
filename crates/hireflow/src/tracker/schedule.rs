//! Scheduling stages and resolving invitation tokens.

use chrono::{DateTime, Utc};
use tracing::{info, info_span, warn, Instrument};

use crate::model::{event::active_event, DeliveryStatus, EventStatus, Invitation, StageEvent};
use crate::notify::StageNotice;
use crate::store::WriteBatch;

use super::outcome::ScheduleOutcome;
use super::{now_after, push_candidate_update, PipelineError, PipelineTracker};

/// Parameters of [`PipelineTracker::schedule_stage`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRequest {
    pub candidate_id: String,
    pub stage_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub meeting_link: String,
    pub attendees: Vec<String>,
    pub notes: Option<String>,
}

impl ScheduleRequest {
    pub fn new(
        candidate_id: &str,
        stage_id: &str,
        scheduled_at: DateTime<Utc>,
        meeting_link: &str,
    ) -> Self {
        Self {
            candidate_id: candidate_id.to_string(),
            stage_id: stage_id.to_string(),
            scheduled_at,
            meeting_link: meeting_link.to_string(),
            attendees: Vec::new(),
            notes: None,
        }
    }

    pub fn attendee(mut self, address: &str) -> Self {
        self.attendees.push(address.to_string());
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.stage_id.trim().is_empty() {
            return Err(PipelineError::validation("stage id is required"));
        }
        if self.meeting_link.trim().is_empty() {
            return Err(PipelineError::validation("meeting link is required"));
        }
        if self.attendees.iter().any(|a| a.trim().is_empty()) {
            return Err(PipelineError::validation(
                "attendee address must not be blank",
            ));
        }
        Ok(())
    }
}

impl PipelineTracker {
    /// Schedules a candidate at a stage and notifies the attendees.
    ///
    /// An active, non-terminal event of the stage is rescheduled in place;
    /// otherwise a new event and invitation are created. All writes commit
    /// together before dispatch. A failed dispatch is reported as
    /// [`PipelineError::DispatchFailure`] and leaves the schedule in place.
    pub async fn schedule_stage(
        &self,
        request: ScheduleRequest,
    ) -> Result<ScheduleOutcome, PipelineError> {
        let span = info_span!(
            "schedule_stage",
            candidate_id = %request.candidate_id,
            stage_id = %request.stage_id
        );
        self.schedule(request).instrument(span).await
    }

    async fn schedule(&self, request: ScheduleRequest) -> Result<ScheduleOutcome, PipelineError> {
        request.validate()?;

        let mut candidate = self.load_candidate(&request.candidate_id).await?;
        let stage = self.load_stage_for(&candidate, &request.stage_id).await?;
        let events = self.store.events_for_candidate(&candidate.id).await?;
        let now = Utc::now();
        let mut batch = WriteBatch::new();

        let rescheduled = active_event(&events, &stage.id).filter(|e| !e.status.is_terminal());
        let (event, invitation, event_created, invitation_issued) = match rescheduled {
            // Rescheduling resets any non-terminal event, `in_progress`
            // included; it is not a status update through the transition table.
            Some(active) => {
                let mut event = active.clone();
                event.set_status(EventStatus::Scheduled, now_after(active.updated_at));
                event.scheduled_at = Some(request.scheduled_at);
                if request.notes.is_some() {
                    event.notes = request.notes.clone();
                }
                batch.update_event(event.clone(), active.status);

                let current = self.store.invitation_for_event(&event.id).await?;
                let (invitation, issued) = match current {
                    Some(mut live) if live.is_usable_at(now) => {
                        live.meeting_link = request.meeting_link.clone();
                        live.delivery_status = DeliveryStatus::Pending;
                        batch.update_invitation(live.clone());
                        (live, false)
                    }
                    Some(mut stale) => {
                        stale.delivery_status = DeliveryStatus::Superseded;
                        batch.update_invitation(stale);
                        let link = &request.meeting_link;
                        (self.issue_invitation(&mut batch, &event.id, link, now), true)
                    }
                    None => (
                        self.issue_invitation(&mut batch, &event.id, &request.meeting_link, now),
                        true,
                    ),
                };
                (event, invitation, false, issued)
            }
            None => {
                let mut event =
                    StageEvent::new(&candidate.id, &stage.id, EventStatus::Pending, now);
                event.scheduled_at = Some(request.scheduled_at);
                event.notes = request.notes.clone();
                batch.insert_event(event.clone());
                let invitation =
                    self.issue_invitation(&mut batch, &event.id, &request.meeting_link, now);
                (event, invitation, true, true)
            }
        };

        candidate.current_stage_id = Some(stage.id.clone());
        push_candidate_update(&mut batch, &mut candidate, now);
        self.store.commit(batch).await?;

        info!(
            event_id = %event.id,
            event_created,
            invitation_issued,
            "Stage scheduled"
        );

        let notice = StageNotice {
            candidate_id: candidate.id.clone(),
            stage_name: stage.name.clone(),
            scheduled_at: request.scheduled_at,
            meeting_link: invitation.meeting_link.clone(),
            invitation_token: invitation.token.clone(),
            join_url: self.settings.join_url(&invitation.token),
            attendees: request.attendees.clone(),
            notes: request.notes.clone(),
        };
        let dispatched = self.dispatcher.dispatch(&notice).await;

        let mut outcome = ScheduleOutcome {
            candidate,
            event,
            invitation,
            event_created,
            invitation_issued,
        };
        outcome.invitation.delivery_status = match dispatched {
            Ok(()) => DeliveryStatus::Sent,
            Err(_) => DeliveryStatus::Failed,
        };
        let mut batch = WriteBatch::new();
        batch.update_invitation(outcome.invitation.clone());
        if let Err(e) = self.store.commit(batch).await {
            warn!(error = %e, "Could not record invitation delivery status");
        }

        match dispatched {
            Ok(()) => Ok(outcome),
            Err(source) => {
                warn!(error = %source, "Stage notice dispatch failed");
                Err(PipelineError::DispatchFailure {
                    outcome: Box::new(outcome),
                    source,
                })
            }
        }
    }

    fn issue_invitation(
        &self,
        batch: &mut WriteBatch,
        event_id: &str,
        meeting_link: &str,
        now: DateTime<Utc>,
    ) -> Invitation {
        let invitation =
            Invitation::issue(event_id, meeting_link, self.settings.invitation_ttl, now);
        batch.insert_invitation(invitation.clone());
        invitation
    }

    /// Resolves an invitation token to its invitation and stage event.
    pub async fn invitation_by_token(
        &self,
        token: &str,
    ) -> Result<(Invitation, StageEvent), PipelineError> {
        let invitation = self
            .store
            .invitation_by_token(token)
            .await?
            .ok_or_else(|| PipelineError::not_found("invitation", token))?;

        let now = Utc::now();
        if invitation.delivery_status == DeliveryStatus::Superseded {
            return Err(PipelineError::validation("invitation superseded"));
        }
        if invitation.is_expired_at(now) {
            return Err(PipelineError::validation("invitation expired"));
        }

        let event = self
            .store
            .event(&invitation.event_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("stage event", &invitation.event_id))?;
        Ok((invitation, event))
    }
}
