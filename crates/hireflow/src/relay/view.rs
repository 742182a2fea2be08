//! Observer-side reconciliation of a candidate's stage events.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;

use crate::broadcast::{ChangeKind, EventChange};
use crate::catalog::StageCatalog;
use crate::model::{event, EventStatus, StageEvent};
use crate::tracker::{compute_progress, Progress};

/// What a change did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    Inserted,
    Updated,
    Deleted,
    /// Older than the local copy; discarded.
    IgnoredStale,
    /// Targets an event already deleted; discarded.
    IgnoredDeleted,
    /// Belongs to another candidate.
    Unrelated,
}

impl Reconcile {
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            Reconcile::Inserted | Reconcile::Updated | Reconcile::Deleted
        )
    }
}

/// Local copy of one candidate's events, kept in sync by change notifications.
///
/// Conflicts resolve last-write-wins on `updated_at`; on a tie the incoming
/// version wins.
#[derive(Debug, Clone)]
pub struct StatusView {
    candidate_id: String,
    /// Ordered by creation, oldest first.
    events: Vec<StageEvent>,
    deleted: HashSet<String>,
    live_window: Duration,
    live_until: Option<Instant>,
    stale: bool,
}

impl StatusView {
    pub fn new(candidate_id: &str, events: Vec<StageEvent>, live_window: Duration) -> Self {
        let mut view = Self {
            candidate_id: candidate_id.to_string(),
            events: Vec::new(),
            deleted: HashSet::new(),
            live_window,
            live_until: None,
            stale: false,
        };
        view.replace_all(events);
        view
    }

    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    pub fn events(&self) -> &[StageEvent] {
        &self.events
    }

    pub fn event(&self, id: &str) -> Option<&StageEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// The most recent event of a stage.
    pub fn active_event(&self, stage_id: &str) -> Option<&StageEvent> {
        event::active_event(&self.events, stage_id)
    }

    pub fn progress(&self, catalog: &StageCatalog) -> Progress {
        compute_progress(catalog, &self.events)
    }

    /// Whether an event went `in_progress` within the live window.
    pub fn is_live(&self) -> bool {
        self.is_live_at(Instant::now())
    }

    pub fn is_live_at(&self, now: Instant) -> bool {
        self.live_until.is_some_and(|until| now < until)
    }

    /// Set when notifications may have been missed.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    /// Replaces the local state with an authoritative read and clears the
    /// stale flag.
    ///
    /// Tombstones for events the read no longer returns are dropped.
    pub fn replace_all(&mut self, mut events: Vec<StageEvent>) {
        self.deleted.retain(|id| events.iter().any(|e| &e.id == id));
        events.retain(|e| e.candidate_id == self.candidate_id && !self.deleted.contains(&e.id));
        events.sort_by_key(|e| e.created_at);
        self.events = events;
        self.stale = false;
    }

    /// Applies one change notification.
    pub fn apply(&mut self, change: EventChange) -> Reconcile {
        let EventChange { kind, event } = change;
        if event.candidate_id != self.candidate_id {
            return Reconcile::Unrelated;
        }

        if kind == ChangeKind::Delete {
            self.events.retain(|e| e.id != event.id);
            self.deleted.insert(event.id);
            return Reconcile::Deleted;
        }
        if self.deleted.contains(&event.id) {
            return Reconcile::IgnoredDeleted;
        }

        let goes_live = event.status == EventStatus::InProgress;
        let outcome = match self.events.iter().position(|e| e.id == event.id) {
            Some(i) if event.updated_at < self.events[i].updated_at => {
                return Reconcile::IgnoredStale
            }
            Some(i) => {
                self.events[i] = event;
                Reconcile::Updated
            }
            None => {
                let at = self
                    .events
                    .iter()
                    .rposition(|e| e.created_at <= event.created_at)
                    .map_or(0, |p| p + 1);
                self.events.insert(at, event);
                Reconcile::Inserted
            }
        };

        if goes_live {
            self.live_until = Instant::now().checked_add(self.live_window);
        }
        outcome
    }
}
