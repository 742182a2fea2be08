//! Response repository: interview answers and transcripts.

use rusqlite::{params, Connection, Row};

use super::DatabaseError;

/// A raw response row from the database.
#[derive(Debug, Clone)]
pub struct ResponseRow {
    pub id: String,
    pub event_id: String,
    pub question: Option<String>,
    pub answer: String,
    pub created_at: String,
}

impl ResponseRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            event_id: row.get("event_id")?,
            question: row.get("question")?,
            answer: row.get("answer")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Inserts a new response row.
pub fn insert(conn: &Connection, response: &ResponseRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO responses (id, event_id, question, answer, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            response.id,
            response.event_id,
            response.question,
            response.answer,
            response.created_at,
        ],
    )?;
    Ok(())
}

/// Lists every response attached to any event of the candidate.
pub fn list_by_candidate(
    conn: &Connection,
    candidate_id: &str,
) -> Result<Vec<ResponseRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT r.* FROM responses r
         JOIN stage_events e ON e.id = r.event_id
         WHERE e.candidate_id = ?1
         ORDER BY r.created_at, r.rowid",
    )?;
    let rows = stmt
        .query_map(params![candidate_id], ResponseRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Deletes every response attached to any event of the candidate.
/// Returns the number of rows removed.
pub fn delete_by_candidate(conn: &Connection, candidate_id: &str) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM responses
         WHERE event_id IN (SELECT id FROM stage_events WHERE candidate_id = ?1)",
        params![candidate_id],
    )?;
    Ok(removed)
}
