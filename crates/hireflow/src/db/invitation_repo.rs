//! Invitation repository: tokenized stage links in the `invitations` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;

/// A raw invitation row from the database.
#[derive(Debug, Clone)]
pub struct InvitationRow {
    pub id: String,
    pub event_id: String,
    pub token: String,
    pub meeting_link: String,
    pub expires_at: String,
    pub delivery_status: String,
    pub created_at: String,
}

impl InvitationRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            event_id: row.get("event_id")?,
            token: row.get("token")?,
            meeting_link: row.get("meeting_link")?,
            expires_at: row.get("expires_at")?,
            delivery_status: row.get("delivery_status")?,
            created_at: row.get("created_at")?,
        })
    }
}

/// Inserts a new invitation row.
pub fn insert(conn: &Connection, invite: &InvitationRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO invitations (id, event_id, token, meeting_link, expires_at,
         delivery_status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            invite.id,
            invite.event_id,
            invite.token,
            invite.meeting_link,
            invite.expires_at,
            invite.delivery_status,
            invite.created_at,
        ],
    )?;
    Ok(())
}

/// Resolves a token to its invitation.
pub fn find_by_token(conn: &Connection, token: &str) -> Result<Option<InvitationRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM invitations WHERE token = ?1",
            params![token],
            InvitationRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Returns the most recently issued invitation for an event.
pub fn latest_for_event(
    conn: &Connection,
    event_id: &str,
) -> Result<Option<InvitationRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT * FROM invitations WHERE event_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            params![event_id],
            InvitationRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Updates the link, expiry and delivery status of an invitation.
/// The token never changes. Returns the number of rows changed.
pub fn update(conn: &Connection, invite: &InvitationRow) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE invitations SET meeting_link=?2, expires_at=?3, delivery_status=?4
         WHERE id=?1",
        params![
            invite.id,
            invite.meeting_link,
            invite.expires_at,
            invite.delivery_status,
        ],
    )?;
    Ok(changed)
}

/// Counts the invitations issued for an event, superseded ones included.
pub fn count_for_event(conn: &Connection, event_id: &str) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM invitations WHERE event_id = ?1",
        params![event_id],
        |r| r.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{candidate_repo, event_repo, stage_repo, Database};

    fn seed(conn: &Connection) -> Result<(), DatabaseError> {
        stage_repo::insert(
            conn,
            &stage_repo::StageRow {
                id: "s1".to_string(),
                job_id: "job-1".to_string(),
                name: "Screening".to_string(),
                stage_order: 1,
                is_ai_automated: false,
            },
        )?;
        candidate_repo::insert(
            conn,
            &candidate_repo::CandidateRow {
                id: "c1".to_string(),
                candidate_ref: "profile-1".to_string(),
                job_id: "job-1".to_string(),
                current_stage_id: Some("s1".to_string()),
                status: "active".to_string(),
                ai_score: None,
                ai_analysis: None,
                resume_ref: None,
                applied_at: "2026-01-01T00:00:00.000000Z".to_string(),
                updated_at: "2026-01-01T00:00:00.000000Z".to_string(),
                version: 0,
            },
        )?;
        event_repo::insert(
            conn,
            &event_repo::EventRow {
                id: "e1".to_string(),
                candidate_id: "c1".to_string(),
                stage_id: "s1".to_string(),
                status: "pending".to_string(),
                scheduled_at: None,
                completed_at: None,
                ai_score: None,
                notes: None,
                created_at: "2026-01-01T00:00:00.000000Z".to_string(),
                updated_at: "2026-01-01T00:00:00.000000Z".to_string(),
            },
        )
    }

    fn sample_invite(id: &str, token: &str, created_at: &str) -> InvitationRow {
        InvitationRow {
            id: id.to_string(),
            event_id: "e1".to_string(),
            token: token.to_string(),
            meeting_link: "https://meet.example/one".to_string(),
            expires_at: "2026-01-08T00:00:00.000000Z".to_string(),
            delivery_status: "pending".to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_find_by_token_and_latest() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            seed(conn)?;
            insert(conn, &sample_invite("i1", "tok-1", "2026-01-01T00:00:00.000000Z"))?;
            insert(conn, &sample_invite("i2", "tok-2", "2026-01-09T00:00:00.000000Z"))?;

            assert_eq!(find_by_token(conn, "tok-1")?.unwrap().id, "i1");
            assert!(find_by_token(conn, "tok-x")?.is_none());
            assert_eq!(latest_for_event(conn, "e1")?.unwrap().id, "i2");
            assert_eq!(count_for_event(conn, "e1")?, 2);
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_token_is_unique() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            seed(conn)?;
            insert(conn, &sample_invite("i1", "tok-1", "2026-01-01T00:00:00.000000Z"))?;
            let dup = insert(conn, &sample_invite("i2", "tok-1", "2026-01-01T00:00:00.000000Z"));
            assert!(dup.is_err());
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_update_keeps_token() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            seed(conn)?;
            let mut invite = sample_invite("i1", "tok-1", "2026-01-01T00:00:00.000000Z");
            insert(conn, &invite)?;

            invite.meeting_link = "https://meet.example/two".to_string();
            invite.delivery_status = "sent".to_string();
            assert_eq!(update(conn, &invite)?, 1);

            let found = find_by_token(conn, "tok-1")?.unwrap();
            assert_eq!(found.meeting_link, "https://meet.example/two");
            assert_eq!(found.delivery_status, "sent");
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }

    #[test]
    fn test_invitations_cascade_with_their_event() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            seed(conn)?;
            insert(conn, &sample_invite("i1", "tok-1", "2026-01-01T00:00:00.000000Z"))?;

            event_repo::delete_by_candidate(conn, "c1")?;
            assert!(find_by_token(conn, "tok-1")?.is_none());
            Ok::<_, DatabaseError>(())
        })
        .unwrap();
    }
}
