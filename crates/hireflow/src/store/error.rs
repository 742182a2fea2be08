use thiserror::Error;

use crate::db::DatabaseError;

/// Errors from the persistence collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// A conditional write found the row changed since it was read.
    #[error("{entity} '{id}' was modified concurrently")]
    Conflict { entity: &'static str, id: String },

    /// A stored row could not be turned into a domain record.
    #[error("Corrupt {entity} row '{id}': {reason}")]
    Corrupt {
        entity: &'static str,
        id: String,
        reason: String,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn corrupt(entity: &'static str, id: &str, reason: impl ToString) -> Self {
        StoreError::Corrupt {
            entity,
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }
}
