//! Schema migrations.
//!
//! Applied versions are recorded in `_migrations`. Each pending migration
//! runs in its own transaction together with its ledger row, so a failed
//! migration leaves the schema at the previous version.

use rusqlite::{params, Connection};

use super::error::DatabaseError;

const LEDGER: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);";

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
    guard: Guard,
}

/// When a migration's SQL actually has to run.
enum Guard {
    Always,
    /// `ALTER TABLE ... ADD COLUMN` fails on a repeat, so skip when present.
    UnlessColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Migration {
    fn is_needed(&self, conn: &Connection) -> Result<bool, DatabaseError> {
        match self.guard {
            Guard::Always => Ok(true),
            Guard::UnlessColumn { table, column } => {
                Ok(!column_exists(conn, table, column)?)
            }
        }
    }
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_stages",
        sql: include_str!("sql/001_create_stages.sql"),
        guard: Guard::Always,
    },
    Migration {
        version: 2,
        name: "create_candidates",
        sql: include_str!("sql/002_create_candidates.sql"),
        guard: Guard::Always,
    },
    Migration {
        version: 3,
        name: "create_stage_events",
        sql: include_str!("sql/003_create_stage_events.sql"),
        guard: Guard::Always,
    },
    Migration {
        version: 4,
        name: "create_invitations",
        sql: include_str!("sql/004_create_invitations.sql"),
        guard: Guard::Always,
    },
    Migration {
        version: 5,
        name: "create_responses",
        sql: include_str!("sql/005_create_responses.sql"),
        guard: Guard::Always,
    },
    Migration {
        version: 6,
        name: "add_candidate_resume_ref",
        sql: include_str!("sql/006_add_resume_ref.sql"),
        guard: Guard::UnlessColumn {
            table: "candidates",
            column: "resume_ref",
        },
    },
];

/// Highest version recorded in the ledger, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32, DatabaseError> {
    conn.execute_batch(LEDGER)?;
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;
    Ok(version)
}

/// Brings the schema up to the latest version.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    let current = schema_version(conn)?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();
    if pending.is_empty() {
        log::debug!("Schema is current at v{}", current);
        return Ok(());
    }

    for migration in pending {
        apply(conn, migration)?;
    }
    Ok(())
}

fn apply(conn: &Connection, migration: &Migration) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    if migration.is_needed(&tx)? {
        log::info!("Applying migration v{} ({})", migration.version, migration.name);
        tx.execute_batch(migration.sql)
            .map_err(|source| DatabaseError::Migration {
                version: migration.version,
                name: migration.name,
                source,
            })?;
    } else {
        log::info!(
            "Migration v{} ({}) already reflected in schema, recording only",
            migration.version,
            migration.name
        );
    }

    tx.execute(
        "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
        params![migration.version, migration.name],
    )?;
    tx.commit()?;
    Ok(())
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    // PRAGMA arguments cannot be bound as parameters.
    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DatabaseError::InvalidIdentifier(table.to_string()));
    }
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name == column))
}
