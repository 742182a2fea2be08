//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};

use hireflow::{CandidateStatus, PipelineCandidate, Stage};

pub const JOB_ID: &str = "job-backend";

/// Builder for creating `PipelineCandidate` instances.
pub struct CandidateBuilder {
    candidate: PipelineCandidate,
}

impl CandidateBuilder {
    /// Create a new builder for a freshly applied candidate of [`JOB_ID`].
    pub fn new(id: &str) -> Self {
        Self {
            candidate: PipelineCandidate::applied(id, &format!("profile-{}", id), JOB_ID),
        }
    }

    /// Set the job the candidate applied to.
    pub fn job(mut self, job_id: &str) -> Self {
        self.candidate.job_id = job_id.to_string();
        self
    }

    /// Position the candidate at a stage.
    pub fn at_stage(mut self, stage_id: &str) -> Self {
        self.candidate.current_stage_id = Some(stage_id.to_string());
        self
    }

    pub fn status(mut self, status: CandidateStatus) -> Self {
        self.candidate.status = status;
        self
    }

    pub fn resume(mut self, resume_ref: &str) -> Self {
        self.candidate.resume_ref = Some(resume_ref.to_string());
        self
    }

    /// Backdate the application so ordering by `applied_at` is deterministic.
    pub fn applied_minutes_ago(mut self, minutes: i64) -> Self {
        let at = Utc::now() - Duration::minutes(minutes);
        self.candidate.applied_at = at;
        self.candidate.updated_at = at;
        self
    }

    pub fn build(self) -> PipelineCandidate {
        self.candidate
    }
}

/// Builder for the stages of one job.
pub struct StagesBuilder {
    job_id: String,
    stages: Vec<Stage>,
}

impl StagesBuilder {
    pub fn new(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            stages: Vec::new(),
        }
    }

    /// Append a stage; its order follows the stages added before it.
    pub fn stage(mut self, id: &str, name: &str) -> Self {
        let order = self.stages.len() as i64 + 1;
        self.stages.push(Stage::new(id, &self.job_id, name, order));
        self
    }

    /// Append a stage flagged as automation-only.
    pub fn automated_stage(mut self, id: &str, name: &str) -> Self {
        let order = self.stages.len() as i64 + 1;
        self.stages
            .push(Stage::new(id, &self.job_id, name, order).automated());
        self
    }

    pub fn build(self) -> Vec<Stage> {
        self.stages
    }
}

/// Screening, Technical, HR for [`JOB_ID`].
pub fn three_stage_job() -> Vec<Stage> {
    StagesBuilder::new(JOB_ID)
        .stage("screening", "Screening")
        .stage("technical", "Technical")
        .stage("hr", "HR")
        .build()
}

/// AI Screening (flagged), Technical, HR for [`JOB_ID`].
pub fn automated_job() -> Vec<Stage> {
    StagesBuilder::new(JOB_ID)
        .automated_stage("ai-screen", "AI Screening")
        .stage("technical", "Technical")
        .stage("hr", "HR")
        .build()
}

/// A schedule time a day from now.
pub fn tomorrow() -> DateTime<Utc> {
    Utc::now() + Duration::days(1)
}
