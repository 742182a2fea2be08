//! Live status relay: per-candidate watches over the change feed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info_span, warn, Instrument};

use crate::broadcast::{EventSubscription, SubscriptionError};
use crate::store::{PipelineStore, StoreError};

use super::view::{Reconcile, StatusView};

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Change feed closed")]
    Closed,
}

/// Live subscription counts per candidate.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl SubscriptionRegistry {
    /// Counts a new subscription until the returned guard is dropped.
    pub fn register(&self, candidate_id: &str) -> SubscriptionGuard {
        if let Ok(mut counts) = self.counts.lock() {
            *counts.entry(candidate_id.to_string()).or_insert(0) += 1;
        }
        SubscriptionGuard {
            candidate_id: candidate_id.to_string(),
            counts: Arc::clone(&self.counts),
        }
    }

    pub fn count(&self, candidate_id: &str) -> usize {
        self.counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(candidate_id).copied())
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }
}

/// Keeps a subscription counted while alive.
pub struct SubscriptionGuard {
    candidate_id: String,
    counts: Arc<Mutex<HashMap<String, usize>>>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Ok(mut counts) = self.counts.lock() {
            if let Some(count) = counts.get_mut(&self.candidate_id) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    counts.remove(&self.candidate_id);
                }
            }
        }
    }
}

/// Opens watches on candidates' stage events.
pub struct LiveStatusRelay {
    store: Arc<dyn PipelineStore>,
    registry: SubscriptionRegistry,
    live_window: Duration,
}

impl LiveStatusRelay {
    pub fn new(store: Arc<dyn PipelineStore>) -> Self {
        Self {
            store,
            registry: SubscriptionRegistry::default(),
            live_window: Duration::from_secs(5),
        }
    }

    /// How long an `in_progress` change keeps the live indicator raised.
    pub fn with_live_window(mut self, live_window: Duration) -> Self {
        self.live_window = live_window;
        self
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Subscribes to a candidate's event changes and loads the current state.
    ///
    /// The subscription opens before the read so no change committed in
    /// between is lost.
    pub async fn watch(&self, candidate_id: &str) -> Result<CandidateWatch, RelayError> {
        let span = info_span!("relay_watch", candidate_id = %candidate_id);
        async {
            let subscription = self.store.subscribe_events(candidate_id);
            let guard = self.registry.register(candidate_id);
            let events = self.store.events_for_candidate(candidate_id).await?;
            debug!(events = events.len(), "Watch opened");

            Ok(CandidateWatch {
                view: StatusView::new(candidate_id, events, self.live_window),
                subscription,
                store: Arc::clone(&self.store),
                _guard: guard,
            })
        }
        .instrument(span)
        .await
    }
}

/// What [`CandidateWatch::next`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchUpdate {
    Change(Reconcile),
    /// Changes were dropped; the view was reloaded from the store.
    Resynced { skipped: u64 },
}

/// One observer's live view of a candidate. Dropping it ends the subscription.
pub struct CandidateWatch {
    view: StatusView,
    subscription: EventSubscription,
    store: Arc<dyn PipelineStore>,
    _guard: SubscriptionGuard,
}

impl CandidateWatch {
    pub fn view(&self) -> &StatusView {
        &self.view
    }

    pub fn candidate_id(&self) -> &str {
        self.view.candidate_id()
    }

    /// Waits for the next change and reconciles the view with it.
    pub async fn next(&mut self) -> Result<WatchUpdate, RelayError> {
        match self.subscription.recv().await {
            Ok(change) => Ok(WatchUpdate::Change(self.view.apply(change))),
            Err(SubscriptionError::Lagged { skipped }) => {
                warn!(
                    candidate_id = %self.view.candidate_id(),
                    skipped,
                    "Relay lagged, reloading events"
                );
                self.view.mark_stale();
                self.resync().await?;
                Ok(WatchUpdate::Resynced { skipped })
            }
            Err(SubscriptionError::Closed) => Err(RelayError::Closed),
        }
    }

    /// Reloads the authoritative event list.
    pub async fn resync(&mut self) -> Result<(), RelayError> {
        let events = self
            .store
            .events_for_candidate(self.view.candidate_id())
            .await?;
        self.view.replace_all(events);
        Ok(())
    }

    /// Ends the watch.
    pub fn close(self) {}
}
