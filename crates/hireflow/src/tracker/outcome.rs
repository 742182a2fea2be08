//! Results of tracker operations.

use crate::model::{EventStatus, Invitation, PipelineCandidate, StageEvent};

use super::error::PipelineError;

/// Result of [`advance_to_next_stage`](super::PipelineTracker::advance_to_next_stage).
#[derive(Debug, Clone)]
pub enum AdvanceOutcome {
    Advanced {
        /// Stage left behind; `None` when entering the first stage.
        from_stage_id: Option<String>,
        to_stage_id: String,
        candidate: PipelineCandidate,
        /// Event of the stage left behind, now `passed`.
        passed_event: Option<StageEvent>,
        /// New `pending` event of the stage entered.
        entered_event: StageEvent,
    },
    /// The candidate is at the last stage. Nothing was written.
    AlreadyAtFinalStage { stage_id: String },
}

impl AdvanceOutcome {
    pub fn is_advanced(&self) -> bool {
        matches!(self, AdvanceOutcome::Advanced { .. })
    }

    /// Stage the candidate is at after the call.
    pub fn current_stage_id(&self) -> &str {
        match self {
            AdvanceOutcome::Advanced { to_stage_id, .. } => to_stage_id,
            AdvanceOutcome::AlreadyAtFinalStage { stage_id } => stage_id,
        }
    }
}

/// What a committed schedule produced.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub candidate: PipelineCandidate,
    pub event: StageEvent,
    /// Invitation carrying the link; its delivery status reflects dispatch.
    pub invitation: Invitation,
    /// A new event was inserted rather than an active one rescheduled.
    pub event_created: bool,
    /// A new token was issued rather than an existing one updated.
    pub invitation_issued: bool,
}

/// Result of [`update_event_status`](super::PipelineTracker::update_event_status).
#[derive(Debug, Clone)]
pub enum StatusOutcome {
    Changed {
        previous: EventStatus,
        event: StageEvent,
    },
    /// The event already had the requested status.
    Unchanged { event: StageEvent },
}

impl StatusOutcome {
    pub fn event(&self) -> &StageEvent {
        match self {
            StatusOutcome::Changed { event, .. } | StatusOutcome::Unchanged { event } => event,
        }
    }
}

/// Rows removed by [`remove_candidate`](super::PipelineTracker::remove_candidate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalReport {
    pub candidate_id: String,
    pub responses_removed: usize,
    pub events_removed: usize,
    pub candidate_removed: bool,
}

/// Outcome of moving one candidate inside a bulk move.
#[derive(Debug)]
pub struct BulkMoveItem {
    pub candidate_id: String,
    pub result: Result<PipelineCandidate, PipelineError>,
}

/// Per-candidate results of a bulk move, in request order.
#[derive(Debug)]
pub struct BulkMoveReport {
    pub target_stage_id: String,
    pub items: Vec<BulkMoveItem>,
}

impl BulkMoveReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter(|i| i.result.is_ok())
            .map(|i| i.candidate_id.as_str())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
        self.items.iter().filter_map(|i| match &i.result {
            Err(e) => Some((i.candidate_id.as_str(), e)),
            Ok(_) => None,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|i| i.result.is_ok())
    }

    /// Collapses the report, failing with `PartialBulkFailure` if any item failed.
    pub fn into_result(self) -> Result<Vec<PipelineCandidate>, PipelineError> {
        if self.is_complete() {
            return Ok(self
                .items
                .into_iter()
                .filter_map(|i| i.result.ok())
                .collect());
        }

        let failed = self.failed().map(|(id, _)| id.to_string()).collect();
        let succeeded = self.succeeded().map(str::to_string).collect();
        Err(PipelineError::PartialBulkFailure { failed, succeeded })
    }
}

/// Decision taken by [`auto_advance`](super::PipelineTracker::auto_advance).
#[derive(Debug, Clone)]
pub enum AutoAdvanceOutcome {
    /// Score met the threshold and the candidate was advanced.
    Advanced { score: f64, advance: AdvanceOutcome },
    /// Score met the threshold at the job's last stage; the event is now
    /// `passed` and the candidate stays where it is.
    Completed { score: f64, event: StageEvent },
    /// Score fell short; the automated stage's event is now `failed`.
    Rejected { score: f64, event: StageEvent },
}

impl AutoAdvanceOutcome {
    pub fn score(&self) -> f64 {
        match self {
            AutoAdvanceOutcome::Advanced { score, .. }
            | AutoAdvanceOutcome::Completed { score, .. }
            | AutoAdvanceOutcome::Rejected { score, .. } => *score,
        }
    }
}
