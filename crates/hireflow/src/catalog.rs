//! Stage catalog: the ordered stages of a job's pipeline.

use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;

use crate::model::{PipelineCandidate, Stage};

/// Direction of an adjacent-stage lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Returns the stage one ordinal position away from `current_stage_id`.
///
/// `stages` must be sorted by `stage_order`. Moving past either end, or
/// starting from an id not in `stages`, yields `None`.
pub fn resolve_adjacent_stage<'a>(
    stages: &'a [Stage],
    current_stage_id: &str,
    direction: Direction,
) -> Option<&'a Stage> {
    let position = stages.iter().position(|s| s.id == current_stage_id)?;
    match direction {
        Direction::Next => stages.get(position + 1),
        Direction::Previous => position.checked_sub(1).and_then(|p| stages.get(p)),
    }
}

/// Turns a stored identifier into a human-readable label.
///
/// `in_progress` becomes `In Progress`, `hr-review` becomes `Hr Review`.
pub fn display_label(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decides which stages are automation-only.
#[derive(Debug, Clone, Default)]
pub struct AutomationRule {
    name_pattern: Option<Regex>,
}

impl AutomationRule {
    pub fn new(name_pattern: Option<Regex>) -> Self {
        Self { name_pattern }
    }

    /// A stage is automation-only when flagged or when its name matches.
    pub fn is_automated(&self, stage: &Stage) -> bool {
        stage.is_ai_automated
            || self
                .name_pattern
                .as_ref()
                .is_some_and(|re| re.is_match(&stage.name))
    }
}

/// Error building a catalog from persisted stages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Stage '{stage_id}' belongs to job '{found}', expected '{expected}'")]
    MixedJobs {
        stage_id: String,
        expected: String,
        found: String,
    },

    #[error("Duplicate stage order {order} in job '{job_id}'")]
    DuplicateOrder { job_id: String, order: i64 },
}

/// One stage with the candidates currently positioned at it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSnapshot {
    pub stage: Stage,
    pub label: String,
    pub automated: bool,
    pub candidates: Vec<PipelineCandidate>,
}

/// Ordered stages of a single job.
#[derive(Debug, Clone)]
pub struct StageCatalog {
    job_id: String,
    stages: Vec<Stage>,
    automation: AutomationRule,
}

impl StageCatalog {
    /// Builds a catalog, sorting by `stage_order`.
    pub fn new(job_id: &str, mut stages: Vec<Stage>) -> Result<Self, CatalogError> {
        if let Some(stray) = stages.iter().find(|s| s.job_id != job_id) {
            return Err(CatalogError::MixedJobs {
                stage_id: stray.id.clone(),
                expected: job_id.to_string(),
                found: stray.job_id.clone(),
            });
        }

        stages.sort_by_key(|s| s.stage_order);

        let mut seen = HashSet::new();
        for stage in &stages {
            if !seen.insert(stage.stage_order) {
                return Err(CatalogError::DuplicateOrder {
                    job_id: job_id.to_string(),
                    order: stage.stage_order,
                });
            }
        }

        Ok(Self {
            job_id: job_id.to_string(),
            stages,
            automation: AutomationRule::default(),
        })
    }

    pub fn with_automation(mut self, automation: AutomationRule) -> Self {
        self.automation = automation;
        self
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, stage_id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    pub fn contains(&self, stage_id: &str) -> bool {
        self.get(stage_id).is_some()
    }

    pub fn position_of(&self, stage_id: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.id == stage_id)
    }

    pub fn first(&self) -> Option<&Stage> {
        self.stages.first()
    }

    pub fn last(&self) -> Option<&Stage> {
        self.stages.last()
    }

    pub fn next_after(&self, stage_id: &str) -> Option<&Stage> {
        resolve_adjacent_stage(&self.stages, stage_id, Direction::Next)
    }

    pub fn previous_before(&self, stage_id: &str) -> Option<&Stage> {
        resolve_adjacent_stage(&self.stages, stage_id, Direction::Previous)
    }

    pub fn is_automated(&self, stage_id: &str) -> bool {
        self.get(stage_id)
            .is_some_and(|stage| self.automation.is_automated(stage))
    }

    /// The catalog presented to human operators: automation-only stages removed.
    ///
    /// Order of the remaining stages is unchanged.
    pub fn human_facing(&self) -> StageCatalog {
        let stages = self
            .stages
            .iter()
            .filter(|s| !self.automation.is_automated(s))
            .cloned()
            .collect();
        StageCatalog {
            job_id: self.job_id.clone(),
            stages,
            automation: self.automation.clone(),
        }
    }

    /// Groups candidates by their current stage, one entry per catalog stage.
    ///
    /// Candidates without a stage, or positioned at a stage outside this
    /// catalog, are not part of any entry.
    pub fn snapshot(&self, candidates: &[PipelineCandidate]) -> Vec<StageSnapshot> {
        self.stages
            .iter()
            .map(|stage| StageSnapshot {
                stage: stage.clone(),
                label: display_label(&stage.name),
                automated: self.automation.is_automated(stage),
                candidates: candidates
                    .iter()
                    .filter(|c| c.is_at(&stage.id))
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}
