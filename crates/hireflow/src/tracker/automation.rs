//! AI scoring and automated stage decisions.

use chrono::Utc;
use tracing::{info, info_span, warn, Instrument};

use crate::model::{event::active_event, EventStatus, PipelineCandidate, StageEvent};
use crate::scoring::{ScoreReport, ScoreRequest, ScoringError};
use crate::store::WriteBatch;

use super::movement::queue_entry;
use super::outcome::{AdvanceOutcome, AutoAdvanceOutcome};
use super::{now_after, push_candidate_update, PipelineError, PipelineTracker};

impl PipelineTracker {
    /// Scores a candidate and stores the score and analysis on it.
    ///
    /// An unavailable scoring service is retried up to the configured attempt
    /// count; an invalid response is not.
    pub async fn score_candidate(
        &self,
        candidate_id: &str,
    ) -> Result<(PipelineCandidate, ScoreReport), PipelineError> {
        let span = info_span!("score_candidate", candidate_id = %candidate_id);
        async {
            let mut candidate = self.load_candidate(candidate_id).await?;
            let report = self.request_score(&candidate).await?;

            candidate.ai_score = Some(report.score);
            candidate.ai_analysis = Some(report.analysis.clone());
            let mut batch = WriteBatch::new();
            push_candidate_update(&mut batch, &mut candidate, Utc::now());
            self.store.commit(batch).await?;

            info!(score = report.score, "Candidate scored");
            Ok((candidate, report))
        }
        .instrument(span)
        .await
    }

    async fn request_score(
        &self,
        candidate: &PipelineCandidate,
    ) -> Result<ScoreReport, PipelineError> {
        let scorer = self.scorer.as_ref().ok_or_else(|| {
            ScoringError::Unavailable("no scoring service configured".to_string())
        })?;

        let request = ScoreRequest {
            candidate_id: candidate.id.clone(),
            candidate_ref: candidate.candidate_ref.clone(),
            job_id: candidate.job_id.clone(),
            resume_ref: candidate.resume_ref.clone(),
        };

        let attempts = self.settings.scoring_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match scorer.score(&request).await {
                Ok(report) => {
                    if !report.is_in_range() {
                        return Err(PipelineError::validation(format!(
                            "score {} is outside 0-100",
                            report.score
                        )));
                    }
                    return Ok(report);
                }
                Err(e) if !e.is_retryable() => {
                    warn!(attempt, error = %e, "Scoring failed");
                    return Err(e.into());
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "Scoring attempt failed");
                    last_error = Some(e);
                }
            }
        }

        let last = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(ScoringError::Exhausted { attempts, last }.into())
    }

    /// Scores a candidate at an automation-only stage and acts on the score.
    ///
    /// At or above the pass threshold the stage's active event is marked
    /// `passed` and the candidate enters the next stage; below it the event
    /// is marked `failed`. The score lands on the candidate and the event,
    /// and every write of the decision commits together.
    pub async fn auto_advance(
        &self,
        candidate_id: &str,
    ) -> Result<AutoAdvanceOutcome, PipelineError> {
        let span = info_span!("auto_advance", candidate_id = %candidate_id);
        async {
            let mut candidate = self.load_candidate(candidate_id).await?;
            let catalog = self.catalog(&candidate.job_id).await?;
            let stage_id = candidate
                .current_stage_id
                .clone()
                .filter(|id| catalog.is_automated(id))
                .ok_or_else(|| {
                    PipelineError::validation("candidate is not at an automation-only stage")
                })?;

            let report = self.request_score(&candidate).await?;
            let score = report.score;
            let passing = score >= self.settings.pass_threshold;
            let decided = if passing {
                EventStatus::Passed
            } else {
                EventStatus::Failed
            };

            let events = self.store.events_for_candidate(candidate_id).await?;
            let now = Utc::now();
            let mut batch = WriteBatch::new();

            // A terminal event is history; the decision then starts a new one.
            let active = active_event(&events, &stage_id).filter(|e| !e.status.is_terminal());
            let event = match active {
                Some(active) => {
                    let mut event = active.clone();
                    event.ai_score = Some(score);
                    event.set_status(decided, now_after(active.updated_at));
                    batch.update_event(event.clone(), active.status);
                    event
                }
                None => {
                    let mut event = StageEvent::new(candidate_id, &stage_id, decided, now);
                    event.ai_score = Some(score);
                    batch.insert_event(event.clone());
                    event
                }
            };

            candidate.ai_score = Some(score);
            candidate.ai_analysis = Some(report.analysis.clone());
            let next = if passing {
                catalog.next_after(&stage_id).cloned()
            } else {
                None
            };
            let entered = match next {
                Some(next) => {
                    let entered_event = queue_entry(&mut batch, &mut candidate, &next, now);
                    Some((next, entered_event))
                }
                None => {
                    push_candidate_update(&mut batch, &mut candidate, now);
                    None
                }
            };
            self.store.commit(batch).await?;

            match entered {
                Some((next, entered_event)) => {
                    info!(score, to = %next.name, "Automated stage passed");
                    Ok(AutoAdvanceOutcome::Advanced {
                        score,
                        advance: AdvanceOutcome::Advanced {
                            from_stage_id: Some(stage_id),
                            to_stage_id: next.id,
                            candidate,
                            passed_event: Some(event),
                            entered_event,
                        },
                    })
                }
                None if passing => {
                    info!(score, "Automated final stage passed");
                    Ok(AutoAdvanceOutcome::Completed { score, event })
                }
                None => {
                    let threshold = self.settings.pass_threshold;
                    info!(score, threshold, "Automated stage failed");
                    Ok(AutoAdvanceOutcome::Rejected { score, event })
                }
            }
        }
        .instrument(span)
        .await
    }
}
