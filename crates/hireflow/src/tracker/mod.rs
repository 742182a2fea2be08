//! Candidate pipeline tracker.
//!
//! The single authority that moves candidates between stages and mutates
//! their stage events. Every operation reads through the [`PipelineStore`],
//! decides, then commits one [`WriteBatch`](crate::store::WriteBatch) so a
//! concurrent writer surfaces as [`PipelineError::Conflict`] rather than a
//! silent overwrite.

mod automation;
mod error;
mod movement;
mod outcome;
mod progress;
mod removal;
mod schedule;
mod status;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::catalog::{AutomationRule, StageCatalog};
use crate::model::{PipelineCandidate, Stage};
use crate::notify::{NoopDispatcher, NotificationDispatcher};
use crate::scoring::CandidateScorer;
use crate::store::{PipelineStore, WriteBatch};

pub use error::{PipelineError, RemovalStep};
pub use outcome::{
    AdvanceOutcome, AutoAdvanceOutcome, BulkMoveItem, BulkMoveReport, RemovalReport,
    ScheduleOutcome, StatusOutcome,
};
pub use progress::{compute_progress, Progress, ProgressScope};
pub use schedule::ScheduleRequest;

/// Tunables for tracker behaviour.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Lifetime of a freshly issued invitation.
    pub invitation_ttl: Duration,
    /// Base URL of the candidate join page; the token is appended.
    pub link_base: Option<String>,
    /// Minimum AI score that auto-advances a candidate.
    pub pass_threshold: f64,
    /// Scoring calls made before giving up.
    pub scoring_attempts: u32,
    pub automation: AutomationRule,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            invitation_ttl: Duration::days(7),
            link_base: None,
            pass_threshold: 70.0,
            scoring_attempts: 3,
            automation: AutomationRule::default(),
        }
    }
}

impl TrackerSettings {
    /// Join URL for an invitation token, when a link base is configured.
    pub fn join_url(&self, token: &str) -> Option<String> {
        self.link_base
            .as_deref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), token))
    }
}

pub struct PipelineTracker {
    store: Arc<dyn PipelineStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    scorer: Option<Arc<dyn CandidateScorer>>,
    settings: TrackerSettings,
}

impl PipelineTracker {
    /// Creates a tracker that drops notices and has no scoring service.
    pub fn new(store: Arc<dyn PipelineStore>) -> Self {
        Self {
            store,
            dispatcher: Arc::new(NoopDispatcher),
            scorer: None,
            settings: TrackerSettings::default(),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn CandidateScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn with_settings(mut self, settings: TrackerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &Arc<dyn PipelineStore> {
        &self.store
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Builds the catalog of a job with the configured automation rule.
    pub async fn catalog(&self, job_id: &str) -> Result<StageCatalog, PipelineError> {
        let stages = self.store.stages_for_job(job_id).await?;
        let catalog = StageCatalog::new(job_id, stages)
            .map_err(|e| PipelineError::validation(e.to_string()))?;
        Ok(catalog.with_automation(self.settings.automation.clone()))
    }

    async fn load_candidate(&self, candidate_id: &str) -> Result<PipelineCandidate, PipelineError> {
        self.store
            .candidate(candidate_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("candidate", candidate_id))
    }

    /// Loads a stage and checks that it belongs to the candidate's job.
    async fn load_stage_for(
        &self,
        candidate: &PipelineCandidate,
        stage_id: &str,
    ) -> Result<Stage, PipelineError> {
        let stage = self
            .store
            .stage(stage_id)
            .await?
            .ok_or_else(|| PipelineError::not_found("stage", stage_id))?;
        if stage.job_id != candidate.job_id {
            return Err(PipelineError::validation(format!(
                "stage '{}' belongs to job '{}', not '{}'",
                stage.id, stage.job_id, candidate.job_id
            )));
        }
        Ok(stage)
    }
}

/// Current time, never earlier than `floor`.
///
/// Keeps `updated_at` strictly ordered across rapid successive writes to
/// the same row.
pub(crate) fn now_after(floor: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > floor {
        now
    } else {
        floor + Duration::microseconds(1)
    }
}

/// Queues a versioned update of `candidate`, bringing the in-memory copy in
/// line with what the commit will store.
pub(crate) fn push_candidate_update(
    batch: &mut WriteBatch,
    candidate: &mut PipelineCandidate,
    now: DateTime<Utc>,
) {
    let expected = candidate.version;
    candidate.version += 1;
    candidate.updated_at = now_after(candidate.updated_at.max(now));
    batch.update_candidate(candidate.clone(), expected);
}
