//! Moving candidates between stages.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tracing::{debug, info, info_span, Instrument};

use crate::model::{event::active_event, EventStatus, PipelineCandidate, Stage, StageEvent};
use crate::store::WriteBatch;

use super::outcome::{AdvanceOutcome, BulkMoveItem, BulkMoveReport};
use super::{now_after, push_candidate_update, PipelineError, PipelineTracker};

impl PipelineTracker {
    /// Positions a candidate at any stage of its job. No event is created.
    pub async fn move_candidate(
        &self,
        candidate_id: &str,
        target_stage_id: &str,
    ) -> Result<PipelineCandidate, PipelineError> {
        let span = info_span!(
            "move_candidate",
            candidate_id = %candidate_id,
            target = %target_stage_id
        );
        async {
            let mut candidate = self.load_candidate(candidate_id).await?;
            let stage = self.load_stage_for(&candidate, target_stage_id).await?;

            let mut batch = WriteBatch::new();
            candidate.current_stage_id = Some(stage.id.clone());
            push_candidate_update(&mut batch, &mut candidate, Utc::now());
            self.store.commit(batch).await?;

            info!(stage = %stage.name, "Candidate moved");
            Ok(candidate)
        }
        .instrument(span)
        .await
    }

    /// Moves each candidate independently; one failure never blocks the rest.
    pub async fn bulk_move(
        &self,
        candidate_ids: &[String],
        target_stage_id: &str,
    ) -> BulkMoveReport {
        let span = info_span!(
            "bulk_move",
            count = candidate_ids.len(),
            target = %target_stage_id
        );
        async {
            let results = join_all(
                candidate_ids
                    .iter()
                    .map(|id| self.move_candidate(id, target_stage_id)),
            )
            .await;

            let items: Vec<BulkMoveItem> = candidate_ids
                .iter()
                .zip(results)
                .map(|(id, result)| BulkMoveItem {
                    candidate_id: id.clone(),
                    result,
                })
                .collect();

            let failed = items.iter().filter(|i| i.result.is_err()).count();
            if failed > 0 {
                tracing::warn!(failed, total = items.len(), "Bulk move partially failed");
            }

            BulkMoveReport {
                target_stage_id: target_stage_id.to_string(),
                items,
            }
        }
        .instrument(span)
        .await
    }

    /// Passes the current stage and enters the next one in a single commit.
    ///
    /// At the final stage nothing is written and
    /// [`AdvanceOutcome::AlreadyAtFinalStage`] is returned. A candidate with
    /// no stage enters the first one.
    pub async fn advance_to_next_stage(
        &self,
        candidate_id: &str,
    ) -> Result<AdvanceOutcome, PipelineError> {
        let span = info_span!("advance_to_next_stage", candidate_id = %candidate_id);
        self.advance(candidate_id).instrument(span).await
    }

    async fn advance(&self, candidate_id: &str) -> Result<AdvanceOutcome, PipelineError> {
        let mut candidate = self.load_candidate(candidate_id).await?;
        let catalog = self.catalog(&candidate.job_id).await?;
        let now = Utc::now();
        let mut batch = WriteBatch::new();

        let from_stage_id = candidate.current_stage_id.clone();
        let (next, passed_event) = match from_stage_id.as_deref() {
            None => {
                let first = catalog.first().ok_or_else(|| {
                    PipelineError::validation(format!("job '{}' has no stages", candidate.job_id))
                })?;
                (first.clone(), None)
            }
            Some(current) => {
                if !catalog.contains(current) {
                    return Err(PipelineError::not_found("stage", current));
                }
                let Some(next) = catalog.next_after(current) else {
                    debug!(stage_id = %current, "Already at final stage");
                    return Ok(AdvanceOutcome::AlreadyAtFinalStage {
                        stage_id: current.to_string(),
                    });
                };

                let events = self.store.events_for_candidate(candidate_id).await?;
                let passed = queue_pass(&mut batch, &events, candidate_id, current, now)?;
                (next.clone(), Some(passed))
            }
        };

        let entered_event = queue_entry(&mut batch, &mut candidate, &next, now);
        self.store.commit(batch).await?;
        info!(to = %next.name, "Candidate advanced");

        Ok(AdvanceOutcome::Advanced {
            from_stage_id,
            to_stage_id: next.id,
            candidate,
            passed_event,
            entered_event,
        })
    }
}

/// Queues the write that marks the active event of `stage_id` as `passed`.
///
/// An already passed event is returned as is; a stage entered without an
/// event gets a new `passed` one.
pub(super) fn queue_pass(
    batch: &mut WriteBatch,
    events: &[StageEvent],
    candidate_id: &str,
    stage_id: &str,
    now: DateTime<Utc>,
) -> Result<StageEvent, PipelineError> {
    match active_event(events, stage_id) {
        Some(event) if event.status == EventStatus::Passed => Ok(event.clone()),
        Some(event) => {
            if !event.status.can_transition_to(EventStatus::Passed) {
                return Err(PipelineError::InvalidTransition {
                    from: event.status,
                    to: EventStatus::Passed,
                });
            }
            let mut passed = event.clone();
            passed.set_status(EventStatus::Passed, now_after(event.updated_at));
            batch.update_event(passed.clone(), event.status);
            Ok(passed)
        }
        None => {
            let passed = StageEvent::new(candidate_id, stage_id, EventStatus::Passed, now);
            batch.insert_event(passed.clone());
            Ok(passed)
        }
    }
}

/// Queues entry into `next`: a `pending` event plus the candidate update.
pub(super) fn queue_entry(
    batch: &mut WriteBatch,
    candidate: &mut PipelineCandidate,
    next: &Stage,
    now: DateTime<Utc>,
) -> StageEvent {
    let entered = StageEvent::new(&candidate.id, &next.id, EventStatus::Pending, now);
    batch.insert_event(entered.clone());
    candidate.current_stage_id = Some(next.id.clone());
    push_candidate_update(batch, candidate, now);
    entered
}
