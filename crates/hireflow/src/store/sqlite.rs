use async_trait::async_trait;
use rusqlite::Connection;

use crate::broadcast::{ChangeKind, EventChange, EventChangeFeed, EventSubscription};
use crate::db::candidate_repo::{self, CandidateRow};
use crate::db::event_repo::{self, EventRow};
use crate::db::invitation_repo::{self, InvitationRow};
use crate::db::response_repo::{self, ResponseRow};
use crate::db::stage_repo::{self, StageRow};
use crate::db::Database;
use crate::model::{Invitation, PipelineCandidate, ResponseRecord, Stage, StageEvent};

use super::{PipelineStore, StoreError, Write, WriteBatch};

/// [`PipelineStore`] backed by the SQLite [`Database`].
///
/// Every committed change to a stage event is published on the feed after
/// the transaction commits.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
    feed: EventChangeFeed,
}

impl SqliteStore {
    pub fn new(db: Database, feed: EventChangeFeed) -> Self {
        Self { db, feed }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn feed(&self) -> &EventChangeFeed {
        &self.feed
    }

    /// Seeds a stage. Stages are configured outside the tracker.
    pub fn insert_stage(&self, stage: &Stage) -> Result<(), StoreError> {
        let row = StageRow::from(stage);
        self.db
            .with_conn(|conn| stage_repo::insert(conn, &row).map_err(StoreError::from))
    }

    /// Registers a candidate application.
    pub fn insert_candidate(&self, candidate: &PipelineCandidate) -> Result<(), StoreError> {
        let row = CandidateRow::try_from(candidate)?;
        self.db
            .with_conn(|conn| candidate_repo::insert(conn, &row).map_err(StoreError::from))
    }

    /// Stores an interview response against an event.
    pub fn record_response(&self, response: &ResponseRecord) -> Result<(), StoreError> {
        let row = ResponseRow::from(response);
        self.db
            .with_conn(|conn| response_repo::insert(conn, &row).map_err(StoreError::from))
    }
}

fn apply(conn: &Connection, write: &Write) -> Result<(), StoreError> {
    match write {
        Write::UpdateCandidate {
            candidate,
            expected_version,
        } => {
            let row = CandidateRow::try_from(candidate)?;
            if candidate_repo::update_versioned(conn, &row, *expected_version)? == 0 {
                return Err(StoreError::Conflict {
                    entity: "candidate",
                    id: candidate.id.clone(),
                });
            }
        }
        Write::InsertEvent(event) => event_repo::insert(conn, &EventRow::from(event))?,
        Write::UpdateEvent {
            event,
            expected_status,
        } => {
            let row = EventRow::from(event);
            if event_repo::update_if_status(conn, &row, expected_status.as_str())? == 0 {
                return Err(StoreError::Conflict {
                    entity: "stage event",
                    id: event.id.clone(),
                });
            }
        }
        Write::InsertInvitation(invite) => {
            invitation_repo::insert(conn, &InvitationRow::from(invite))?
        }
        Write::UpdateInvitation(invite) => {
            if invitation_repo::update(conn, &InvitationRow::from(invite))? == 0 {
                return Err(StoreError::Conflict {
                    entity: "invitation",
                    id: invite.id.clone(),
                });
            }
        }
    }
    Ok(())
}

fn event_change(write: Write) -> Option<EventChange> {
    match write {
        Write::InsertEvent(event) => Some(EventChange::new(ChangeKind::Insert, event)),
        Write::UpdateEvent { event, .. } => Some(EventChange::new(ChangeKind::Update, event)),
        _ => None,
    }
}

#[async_trait]
impl PipelineStore for SqliteStore {
    async fn stage(&self, id: &str) -> Result<Option<Stage>, StoreError> {
        let row = self
            .db
            .with_conn(|conn| stage_repo::find_by_id(conn, id).map_err(StoreError::from))?;
        Ok(row.map(Stage::from))
    }

    async fn stages_for_job(&self, job_id: &str) -> Result<Vec<Stage>, StoreError> {
        let rows = self
            .db
            .with_conn(|conn| stage_repo::list_by_job(conn, job_id).map_err(StoreError::from))?;
        Ok(rows.into_iter().map(Stage::from).collect())
    }

    async fn candidate(&self, id: &str) -> Result<Option<PipelineCandidate>, StoreError> {
        let row = self
            .db
            .with_conn(|conn| candidate_repo::find_by_id(conn, id).map_err(StoreError::from))?;
        row.map(PipelineCandidate::try_from).transpose()
    }

    async fn candidates_for_job(
        &self,
        job_id: &str,
    ) -> Result<Vec<PipelineCandidate>, StoreError> {
        let rows = self.db.with_conn(|conn| {
            candidate_repo::list_by_job(conn, job_id).map_err(StoreError::from)
        })?;
        rows.into_iter().map(PipelineCandidate::try_from).collect()
    }

    async fn event(&self, id: &str) -> Result<Option<StageEvent>, StoreError> {
        let row = self
            .db
            .with_conn(|conn| event_repo::find_by_id(conn, id).map_err(StoreError::from))?;
        row.map(StageEvent::try_from).transpose()
    }

    async fn events_for_candidate(
        &self,
        candidate_id: &str,
    ) -> Result<Vec<StageEvent>, StoreError> {
        let rows = self.db.with_conn(|conn| {
            event_repo::list_by_candidate(conn, candidate_id).map_err(StoreError::from)
        })?;
        rows.into_iter().map(StageEvent::try_from).collect()
    }

    async fn invitation_for_event(
        &self,
        event_id: &str,
    ) -> Result<Option<Invitation>, StoreError> {
        let row = self.db.with_conn(|conn| {
            invitation_repo::latest_for_event(conn, event_id).map_err(StoreError::from)
        })?;
        row.map(Invitation::try_from).transpose()
    }

    async fn invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        let row = self.db.with_conn(|conn| {
            invitation_repo::find_by_token(conn, token).map_err(StoreError::from)
        })?;
        row.map(Invitation::try_from).transpose()
    }

    async fn responses_for_candidate(
        &self,
        candidate_id: &str,
    ) -> Result<Vec<ResponseRecord>, StoreError> {
        let rows = self.db.with_conn(|conn| {
            response_repo::list_by_candidate(conn, candidate_id).map_err(StoreError::from)
        })?;
        rows.into_iter().map(ResponseRecord::try_from).collect()
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        self.db.with_transaction(|tx| {
            for write in batch.writes() {
                apply(tx, write)?;
            }
            Ok::<_, StoreError>(())
        })?;

        log::debug!("Committed write batch of {} writes", batch.len());

        for change in batch.into_iter().filter_map(event_change) {
            self.feed.send(change);
        }
        Ok(())
    }

    async fn delete_responses_for_candidate(
        &self,
        candidate_id: &str,
    ) -> Result<usize, StoreError> {
        self.db.with_conn(|conn| {
            response_repo::delete_by_candidate(conn, candidate_id).map_err(StoreError::from)
        })
    }

    async fn delete_events_for_candidate(&self, candidate_id: &str) -> Result<usize, StoreError> {
        let removed = self.db.with_transaction(|tx| {
            let rows = event_repo::list_by_candidate(tx, candidate_id)?;
            event_repo::delete_by_candidate(tx, candidate_id)?;
            Ok::<_, StoreError>(rows)
        })?;

        let count = removed.len();
        for row in removed {
            self.feed
                .send(EventChange::new(ChangeKind::Delete, StageEvent::try_from(row)?));
        }
        Ok(count)
    }

    async fn delete_candidate(&self, candidate_id: &str) -> Result<usize, StoreError> {
        self.db.with_conn(|conn| {
            candidate_repo::delete_by_id(conn, candidate_id).map_err(StoreError::from)
        })
    }

    fn subscribe_events(&self, candidate_id: &str) -> EventSubscription {
        self.feed.subscribe(candidate_id)
    }
}
