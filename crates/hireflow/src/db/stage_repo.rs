//! Stage repository: reads and seeds the `stages` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;

/// A raw stage row from the database.
#[derive(Debug, Clone)]
pub struct StageRow {
    pub id: String,
    pub job_id: String,
    pub name: String,
    pub stage_order: i64,
    pub is_ai_automated: bool,
}

impl StageRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            name: row.get("name")?,
            stage_order: row.get("stage_order")?,
            is_ai_automated: row.get("is_ai_automated")?,
        })
    }
}

/// Inserts a new stage row.
pub fn insert(conn: &Connection, stage: &StageRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO stages (id, job_id, name, stage_order, is_ai_automated)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            stage.id,
            stage.job_id,
            stage.name,
            stage.stage_order,
            stage.is_ai_automated,
        ],
    )?;
    Ok(())
}

/// Finds a stage by its ID.
pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<StageRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM stages WHERE id = ?1",
            params![id],
            StageRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Lists the stages of a job ordered by `stage_order`.
pub fn list_by_job(conn: &Connection, job_id: &str) -> Result<Vec<StageRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM stages WHERE job_id = ?1 ORDER BY stage_order")?;
    let rows = stmt
        .query_map(params![job_id], StageRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
