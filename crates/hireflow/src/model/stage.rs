use serde::{Deserialize, Serialize};

/// One step in a job's hiring funnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Unique stage identifier.
    pub id: String,
    /// Job whose pipeline this stage belongs to.
    pub job_id: String,
    /// Display name, e.g. "Technical Assessment".
    pub name: String,
    /// Ordinal position within the job's pipeline (unique per job).
    pub stage_order: i64,
    /// Whether the stage is run entirely by automation (e.g. an AI phone screen).
    #[serde(default)]
    pub is_ai_automated: bool,
}

impl Stage {
    pub fn new(id: &str, job_id: &str, name: &str, stage_order: i64) -> Self {
        Self {
            id: id.to_string(),
            job_id: job_id.to_string(),
            name: name.to_string(),
            stage_order,
            is_ai_automated: false,
        }
    }

    /// Marks the stage as automation-only.
    pub fn automated(mut self) -> Self {
        self.is_ai_automated = true;
        self
    }
}
