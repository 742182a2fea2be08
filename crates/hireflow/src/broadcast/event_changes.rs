//! Change feed for stage event rows.
//!
//! The store publishes one [`EventChange`] per committed insert, update or
//! delete. Observers subscribe per candidate.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::model::StageEvent;

/// Kind of row change.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A committed change to a stage event row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventChange {
    pub kind: ChangeKind,
    /// Row contents after the change (before it, for deletes).
    pub event: StageEvent,
}

impl EventChange {
    pub fn new(kind: ChangeKind, event: StageEvent) -> Self {
        Self { kind, event }
    }
}

/// Broadcasts event changes to every open subscription.
#[derive(Clone)]
pub struct EventChangeFeed {
    sender: Arc<broadcast::Sender<EventChange>>,
}

impl EventChangeFeed {
    /// Creates a feed with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publishes a change to all subscribers.
    pub fn send(&self, change: EventChange) {
        // No active receivers is fine
        let _ = self.sender.send(change);
    }

    /// Subscribes to the changes of a single candidate's events.
    pub fn subscribe(&self, candidate_id: &str) -> EventSubscription {
        EventSubscription {
            candidate_id: candidate_id.to_string(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live receivers across all candidates.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Why a subscription stopped delivering in order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The receiver fell behind and `skipped` changes were dropped.
    #[error("Subscription lagged, {skipped} changes dropped")]
    Lagged { skipped: u64 },

    /// The feed was dropped.
    #[error("Change feed closed")]
    Closed,
}

/// A candidate-filtered receiver on the change feed.
pub struct EventSubscription {
    candidate_id: String,
    receiver: broadcast::Receiver<EventChange>,
}

impl EventSubscription {
    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    /// Waits for the next change to one of this candidate's events.
    ///
    /// After a `Lagged` error the subscription keeps working from the oldest
    /// change still buffered.
    pub async fn recv(&mut self) -> Result<EventChange, SubscriptionError> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if change.event.candidate_id == self.candidate_id => {
                    return Ok(change)
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    return Err(SubscriptionError::Lagged { skipped })
                }
                Err(RecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }
}
