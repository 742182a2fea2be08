//! Candidate repository: CRUD operations for the `candidates` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;

/// A raw candidate row from the database.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    pub id: String,
    pub candidate_ref: String,
    pub job_id: String,
    pub current_stage_id: Option<String>,
    pub status: String,
    pub ai_score: Option<f64>,
    /// JSON-encoded analysis payload.
    pub ai_analysis: Option<String>,
    pub resume_ref: Option<String>,
    pub applied_at: String,
    pub updated_at: String,
    pub version: i64,
}

impl CandidateRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            candidate_ref: row.get("candidate_ref")?,
            job_id: row.get("job_id")?,
            current_stage_id: row.get("current_stage_id")?,
            status: row.get("status")?,
            ai_score: row.get("ai_score")?,
            ai_analysis: row.get("ai_analysis")?,
            resume_ref: row.get("resume_ref")?,
            applied_at: row.get("applied_at")?,
            updated_at: row.get("updated_at")?,
            version: row.get("version")?,
        })
    }
}

/// Inserts a new candidate row.
pub fn insert(conn: &Connection, row: &CandidateRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO candidates (id, candidate_ref, job_id, current_stage_id, status, ai_score,
         ai_analysis, resume_ref, applied_at, updated_at, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            row.id,
            row.candidate_ref,
            row.job_id,
            row.current_stage_id,
            row.status,
            row.ai_score,
            row.ai_analysis,
            row.resume_ref,
            row.applied_at,
            row.updated_at,
            row.version,
        ],
    )?;
    Ok(())
}

/// Finds a candidate by its ID.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<CandidateRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM candidates WHERE id = ?1",
            params![id],
            CandidateRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Lists every candidate of a job, oldest application first.
pub fn list_by_job(conn: &Connection, job_id: &str) -> Result<Vec<CandidateRow>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT * FROM candidates WHERE job_id = ?1 ORDER BY applied_at, id")?;
    let rows = stmt
        .query_map(params![job_id], CandidateRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Overwrites the mutable fields of a candidate if its stored version still
/// equals `expected_version`, bumping the version by one.
///
/// Returns the number of rows changed (0 when the version moved on).
pub fn update_versioned(
    conn: &Connection,
    row: &CandidateRow,
    expected_version: i64,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE candidates SET current_stage_id=?2, status=?3, ai_score=?4, ai_analysis=?5,
         resume_ref=?6, updated_at=?7, version=version + 1
         WHERE id=?1 AND version=?8",
        params![
            row.id,
            row.current_stage_id,
            row.status,
            row.ai_score,
            row.ai_analysis,
            row.resume_ref,
            row.updated_at,
            expected_version,
        ],
    )?;
    Ok(changed)
}

/// Deletes a candidate row. Returns the number of rows removed.
pub fn delete_by_id(conn: &Connection, id: &str) -> Result<usize, DatabaseError> {
    let removed = conn.execute("DELETE FROM candidates WHERE id = ?1", params![id])?;
    Ok(removed)
}
