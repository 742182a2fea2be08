use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An interview response or transcript fragment attached to a stage event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub id: String,
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl ResponseRecord {
    pub fn new(event_id: &str, question: Option<&str>, answer: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_id: event_id.to_string(),
            question: question.map(|q| q.to_string()),
            answer: answer.to_string(),
            created_at: Utc::now(),
        }
    }
}
