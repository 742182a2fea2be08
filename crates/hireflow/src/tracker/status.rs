use tracing::{info, info_span, Instrument};

use crate::model::{event::active_event, EventStatus};
use crate::store::WriteBatch;

use super::outcome::StatusOutcome;
use super::{now_after, PipelineError, PipelineTracker};

impl PipelineTracker {
    /// Transitions the active event of (candidate, stage) to `new_status`.
    ///
    /// Illegal transitions are rejected before any write. Requesting the
    /// current status is a no-op. The write only lands if the event still
    /// has the status that was read.
    pub async fn update_event_status(
        &self,
        candidate_id: &str,
        stage_id: &str,
        new_status: EventStatus,
    ) -> Result<StatusOutcome, PipelineError> {
        let span = info_span!(
            "update_event_status",
            candidate_id = %candidate_id,
            stage_id = %stage_id,
            status = %new_status
        );
        async {
            let candidate = self.load_candidate(candidate_id).await?;
            let events = self.store.events_for_candidate(&candidate.id).await?;
            let active = active_event(&events, stage_id).ok_or_else(|| {
                PipelineError::not_found("stage event", &format!("{}/{}", candidate_id, stage_id))
            })?;

            if active.status == new_status {
                return Ok(StatusOutcome::Unchanged {
                    event: active.clone(),
                });
            }
            if !active.status.can_transition_to(new_status) {
                return Err(PipelineError::InvalidTransition {
                    from: active.status,
                    to: new_status,
                });
            }

            let previous = active.status;
            let mut event = active.clone();
            event.set_status(new_status, now_after(active.updated_at));

            let mut batch = WriteBatch::new();
            batch.update_event(event.clone(), previous);
            self.store.commit(batch).await?;

            info!(from = %previous, "Event status changed");
            Ok(StatusOutcome::Changed { previous, event })
        }
        .instrument(span)
        .await
    }
}
