//! Pipeline progress and snapshots.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info_span, Instrument};

use crate::catalog::{StageCatalog, StageSnapshot};
use crate::model::StageEvent;

use super::{PipelineError, PipelineTracker};

/// Which stages count toward progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressScope {
    /// Every stage of the job.
    #[default]
    AllStages,
    /// Automation-only stages left out.
    HumanFacing,
}

/// Share of a catalog's stages a candidate has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub completed_stages: usize,
    pub total_stages: usize,
    /// Whole percent, rounded down, at most 100.
    pub percent: u32,
}

/// Counts the catalog stages with at least one passed or completed event.
///
/// Each stage counts once however many retries it took. An empty catalog
/// yields 0%.
pub fn compute_progress(catalog: &StageCatalog, events: &[StageEvent]) -> Progress {
    let done: HashSet<&str> = events
        .iter()
        .filter(|e| e.status.is_success() && catalog.contains(&e.stage_id))
        .map(|e| e.stage_id.as_str())
        .collect();

    let total_stages = catalog.len();
    let completed_stages = done.len();
    let percent = if total_stages == 0 {
        0
    } else {
        ((completed_stages * 100) / total_stages).min(100) as u32
    };

    Progress {
        completed_stages,
        total_stages,
        percent,
    }
}

impl PipelineTracker {
    /// Progress of a candidate through its job's pipeline.
    pub async fn progress(
        &self,
        candidate_id: &str,
        scope: ProgressScope,
    ) -> Result<Progress, PipelineError> {
        let candidate = self.load_candidate(candidate_id).await?;
        let catalog = self.catalog(&candidate.job_id).await?;
        let catalog = match scope {
            ProgressScope::AllStages => catalog,
            ProgressScope::HumanFacing => catalog.human_facing(),
        };
        let events = self.store.events_for_candidate(candidate_id).await?;
        Ok(compute_progress(&catalog, &events))
    }

    /// Stages of a job, each with the candidates currently positioned at it.
    pub async fn pipeline_snapshot(
        &self,
        job_id: &str,
    ) -> Result<Vec<StageSnapshot>, PipelineError> {
        let span = info_span!("pipeline_snapshot", job_id = %job_id);
        async {
            let catalog = self.catalog(job_id).await?;
            let candidates = self.store.candidates_for_job(job_id).await?;
            Ok(catalog.snapshot(&candidates))
        }
        .instrument(span)
        .await
    }
}
