//! Persistence collaborator for the pipeline tracker.
//!
//! [`PipelineStore`] is the seam between pipeline logic and storage. The
//! shipped implementation is [`SqliteStore`]; tests wrap it to inject faults.

mod batch;
mod error;
mod rows;
mod sqlite;

use async_trait::async_trait;

use crate::broadcast::EventSubscription;
use crate::model::{Invitation, PipelineCandidate, ResponseRecord, Stage, StageEvent};

pub use batch::{Write, WriteBatch};
pub use error::StoreError;
pub use sqlite::SqliteStore;

/// Storage operations the tracker and relay depend on.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn stage(&self, id: &str) -> Result<Option<Stage>, StoreError>;

    /// Stages of a job ordered by `stage_order`.
    async fn stages_for_job(&self, job_id: &str) -> Result<Vec<Stage>, StoreError>;

    async fn candidate(&self, id: &str) -> Result<Option<PipelineCandidate>, StoreError>;

    async fn candidates_for_job(&self, job_id: &str)
        -> Result<Vec<PipelineCandidate>, StoreError>;

    async fn event(&self, id: &str) -> Result<Option<StageEvent>, StoreError>;

    /// Events of a candidate ordered by creation, oldest first.
    async fn events_for_candidate(&self, candidate_id: &str)
        -> Result<Vec<StageEvent>, StoreError>;

    /// Latest invitation issued for an event.
    async fn invitation_for_event(&self, event_id: &str)
        -> Result<Option<Invitation>, StoreError>;

    async fn invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError>;

    async fn responses_for_candidate(
        &self,
        candidate_id: &str,
    ) -> Result<Vec<ResponseRecord>, StoreError>;

    /// Applies every write of the batch in one transaction.
    ///
    /// A conditional write that matches no row aborts the whole batch with
    /// [`StoreError::Conflict`].
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Deletes the responses attached to any of the candidate's events.
    async fn delete_responses_for_candidate(&self, candidate_id: &str)
        -> Result<usize, StoreError>;

    /// Deletes the candidate's events. Their invitations go with them.
    async fn delete_events_for_candidate(&self, candidate_id: &str) -> Result<usize, StoreError>;

    async fn delete_candidate(&self, candidate_id: &str) -> Result<usize, StoreError>;

    /// Subscribes to committed changes of the candidate's events.
    fn subscribe_events(&self, candidate_id: &str) -> EventSubscription;
}
