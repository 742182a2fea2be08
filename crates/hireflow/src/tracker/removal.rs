use tracing::{info, info_span, warn, Instrument};

use super::error::RemovalStep;
use super::outcome::RemovalReport;
use super::{PipelineError, PipelineTracker};

impl PipelineTracker {
    /// Deletes a candidate with its responses and events.
    ///
    /// Steps commit one at a time: responses, events (invitations go with
    /// them), then the candidate. A failure after the first step yields
    /// [`PipelineError::CascadeFailure`]; calling again finishes the job
    /// because every step deletes by filter.
    pub async fn remove_candidate(
        &self,
        candidate_id: &str,
    ) -> Result<RemovalReport, PipelineError> {
        let span = info_span!("remove_candidate", candidate_id = %candidate_id);
        async {
            if self.store.candidate(candidate_id).await?.is_none() {
                return Err(PipelineError::not_found("candidate", candidate_id));
            }

            let responses_removed = self
                .store
                .delete_responses_for_candidate(candidate_id)
                .await?;

            let events_removed = self
                .store
                .delete_events_for_candidate(candidate_id)
                .await
                .map_err(|source| {
                    cascade_failure(
                        candidate_id,
                        &[RemovalStep::Responses],
                        RemovalStep::Events,
                        source,
                    )
                })?;

            let removed = self
                .store
                .delete_candidate(candidate_id)
                .await
                .map_err(|source| {
                    cascade_failure(
                        candidate_id,
                        &[RemovalStep::Responses, RemovalStep::Events],
                        RemovalStep::Candidate,
                        source,
                    )
                })?;

            info!(responses_removed, events_removed, "Candidate removed");
            Ok(RemovalReport {
                candidate_id: candidate_id.to_string(),
                responses_removed,
                events_removed,
                candidate_removed: removed > 0,
            })
        }
        .instrument(span)
        .await
    }
}

fn cascade_failure(
    candidate_id: &str,
    completed: &[RemovalStep],
    failed_step: RemovalStep,
    source: crate::store::StoreError,
) -> PipelineError {
    warn!(step = %failed_step, error = %source, "Candidate removal stopped partway");
    PipelineError::CascadeFailure {
        candidate_id: candidate_id.to_string(),
        completed: completed.to_vec(),
        failed_step,
        source,
    }
}
