//! Stage event repository: CRUD operations for the `stage_events` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;

/// A raw stage event row from the database.
#[derive(Debug, Clone)]
pub struct EventRow {
    pub id: String,
    pub candidate_id: String,
    pub stage_id: String,
    pub status: String,
    pub scheduled_at: Option<String>,
    pub completed_at: Option<String>,
    pub ai_score: Option<f64>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            candidate_id: row.get("candidate_id")?,
            stage_id: row.get("stage_id")?,
            status: row.get("status")?,
            scheduled_at: row.get("scheduled_at")?,
            completed_at: row.get("completed_at")?,
            ai_score: row.get("ai_score")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Inserts a new event row.
pub fn insert(conn: &Connection, event: &EventRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO stage_events (id, candidate_id, stage_id, status, scheduled_at,
         completed_at, ai_score, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            event.id,
            event.candidate_id,
            event.stage_id,
            event.status,
            event.scheduled_at,
            event.completed_at,
            event.ai_score,
            event.notes,
            event.created_at,
            event.updated_at,
        ],
    )?;
    Ok(())
}

/// Finds an event by its ID.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<EventRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM stage_events WHERE id = ?1",
            params![id],
            EventRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Lists a candidate's events, oldest first. Ties keep insertion order.
pub fn list_by_candidate(
    conn: &Connection,
    candidate_id: &str,
) -> Result<Vec<EventRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT * FROM stage_events WHERE candidate_id = ?1 ORDER BY created_at, rowid",
    )?;
    let rows = stmt
        .query_map(params![candidate_id], EventRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Updates an event if its stored status still equals `expected_status`.
///
/// Returns the number of rows changed (0 when the status moved on).
pub fn update_if_status(
    conn: &Connection,
    event: &EventRow,
    expected_status: &str,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE stage_events SET status=?2, scheduled_at=?3, completed_at=?4, ai_score=?5,
         notes=?6, updated_at=?7
         WHERE id=?1 AND status=?8",
        params![
            event.id,
            event.status,
            event.scheduled_at,
            event.completed_at,
            event.ai_score,
            event.notes,
            event.updated_at,
            expected_status,
        ],
    )?;
    Ok(changed)
}

/// Deletes every event of a candidate. Returns the number of rows removed.
pub fn delete_by_candidate(conn: &Connection, candidate_id: &str) -> Result<usize, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM stage_events WHERE candidate_id = ?1",
        params![candidate_id],
    )?;
    Ok(removed)
}
