//! Test harness for isolated tracker and relay execution.
//!
//! The `TestHarness` struct wires a complete in-memory environment:
//! - `SqliteStore` over an in-memory database and its change feed
//! - `FailingStore` wrapper so tests can inject store faults
//! - `RecordingDispatcher` capturing every stage notice sent

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use serde_json::json;

use hireflow::notify::DispatchError;
use hireflow::tracker::RemovalStep;
use hireflow::{
    Database, EventChangeFeed, EventSubscription, Invitation, LiveStatusRelay,
    NotificationDispatcher, PipelineCandidate, PipelineStore, PipelineTracker, ResponseRecord,
    ScoreReport, ScoreRequest, ScoringError, SqliteStore, Stage, StageEvent, StageNotice,
    StoreError, TrackerSettings, WriteBatch,
};

// ============================================================================
// FailingStore - Configurable failure injection
// ============================================================================

/// What an injected commit failure looks like to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The store is unreachable.
    Unavailable,
    /// Another writer got there first.
    Conflict,
}

/// Store wrapper that injects failures for chosen candidates or removal steps.
///
/// Every injected failure is consumed after one use (single-shot).
pub struct FailingStore {
    inner: Arc<SqliteStore>,
    /// Candidate ids whose next commit fails.
    fail_commit: RwLock<HashMap<String, Fault>>,
    /// Removal steps whose next execution fails.
    fail_step: RwLock<HashSet<RemovalStep>>,
    /// If true, every commit fails.
    fail_all_commits: AtomicBool,
}

impl FailingStore {
    pub fn new(inner: Arc<SqliteStore>) -> Self {
        Self {
            inner,
            fail_commit: RwLock::new(HashMap::new()),
            fail_step: RwLock::new(HashSet::new()),
            fail_all_commits: AtomicBool::new(false),
        }
    }

    /// Fail the next commit that updates the given candidate.
    pub fn fail_commit_for(&self, candidate_id: &str, fault: Fault) {
        self.fail_commit
            .write()
            .unwrap()
            .insert(candidate_id.to_string(), fault);
    }

    /// Fail the next execution of a removal step.
    pub fn fail_step(&self, step: RemovalStep) {
        self.fail_step.write().unwrap().insert(step);
    }

    pub fn fail_all_commits(&self, enabled: bool) {
        self.fail_all_commits.store(enabled, Ordering::SeqCst);
    }

    fn commit_fault(&self, batch: &WriteBatch) -> Option<(Fault, String)> {
        if self.fail_all_commits.load(Ordering::SeqCst) {
            return Some((Fault::Unavailable, "*".to_string()));
        }
        let mut faults = self.fail_commit.write().unwrap();
        let hit = batch
            .candidate_ids()
            .find(|id| faults.contains_key(*id))
            .map(|id| id.to_string())?;
        faults.remove(&hit).map(|fault| (fault, hit))
    }

    fn step_fault(&self, step: RemovalStep, candidate_id: &str) -> Result<(), StoreError> {
        if self.fail_step.write().unwrap().remove(&step) {
            return Err(StoreError::Unavailable(format!(
                "Injected failure at '{}' for {}",
                step, candidate_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PipelineStore for FailingStore {
    async fn stage(&self, id: &str) -> Result<Option<Stage>, StoreError> {
        self.inner.stage(id).await
    }

    async fn stages_for_job(&self, job_id: &str) -> Result<Vec<Stage>, StoreError> {
        self.inner.stages_for_job(job_id).await
    }

    async fn candidate(&self, id: &str) -> Result<Option<PipelineCandidate>, StoreError> {
        self.inner.candidate(id).await
    }

    async fn candidates_for_job(
        &self,
        job_id: &str,
    ) -> Result<Vec<PipelineCandidate>, StoreError> {
        self.inner.candidates_for_job(job_id).await
    }

    async fn event(&self, id: &str) -> Result<Option<StageEvent>, StoreError> {
        self.inner.event(id).await
    }

    async fn events_for_candidate(
        &self,
        candidate_id: &str,
    ) -> Result<Vec<StageEvent>, StoreError> {
        self.inner.events_for_candidate(candidate_id).await
    }

    async fn invitation_for_event(
        &self,
        event_id: &str,
    ) -> Result<Option<Invitation>, StoreError> {
        self.inner.invitation_for_event(event_id).await
    }

    async fn invitation_by_token(&self, token: &str) -> Result<Option<Invitation>, StoreError> {
        self.inner.invitation_by_token(token).await
    }

    async fn responses_for_candidate(
        &self,
        candidate_id: &str,
    ) -> Result<Vec<ResponseRecord>, StoreError> {
        self.inner.responses_for_candidate(candidate_id).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        match self.commit_fault(&batch) {
            Some((Fault::Conflict, id)) => Err(StoreError::Conflict {
                entity: "candidate",
                id,
            }),
            Some((Fault::Unavailable, id)) => Err(StoreError::Unavailable(format!(
                "Injected commit failure for {}",
                id
            ))),
            None => self.inner.commit(batch).await,
        }
    }

    async fn delete_responses_for_candidate(
        &self,
        candidate_id: &str,
    ) -> Result<usize, StoreError> {
        self.step_fault(RemovalStep::Responses, candidate_id)?;
        self.inner.delete_responses_for_candidate(candidate_id).await
    }

    async fn delete_events_for_candidate(&self, candidate_id: &str) -> Result<usize, StoreError> {
        self.step_fault(RemovalStep::Events, candidate_id)?;
        self.inner.delete_events_for_candidate(candidate_id).await
    }

    async fn delete_candidate(&self, candidate_id: &str) -> Result<usize, StoreError> {
        self.step_fault(RemovalStep::Candidate, candidate_id)?;
        self.inner.delete_candidate(candidate_id).await
    }

    fn subscribe_events(&self, candidate_id: &str) -> EventSubscription {
        self.inner.subscribe_events(candidate_id)
    }
}

// ============================================================================
// Collaborator doubles
// ============================================================================

/// Dispatcher that records notices and can be switched to reject them.
#[derive(Default)]
pub struct RecordingDispatcher {
    notices: Mutex<Vec<StageNotice>>,
    failing: AtomicBool,
    rejection: Mutex<Option<String>>,
}

impl RecordingDispatcher {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Refuse every notice with `reason` until cleared with `None`.
    pub fn set_rejecting(&self, reason: Option<&str>) {
        *self.rejection.lock().unwrap() = reason.map(str::to_string);
    }

    pub fn notices(&self) -> Vec<StageNotice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, notice: &StageNotice) -> Result<(), DispatchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DispatchError::Transport("calendar service down".to_string()));
        }
        if let Some(reason) = self.rejection.lock().unwrap().clone() {
            return Err(DispatchError::Rejected { reason });
        }
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// Scorer returning queued results, then repeating a fixed score.
pub struct FixedScorer {
    queued: Mutex<VecDeque<Result<f64, ScoringError>>>,
    score: f64,
    calls: AtomicU32,
}

impl FixedScorer {
    pub fn new(score: f64) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            score,
            calls: AtomicU32::new(0),
        }
    }

    /// Fail the next `count` calls before answering.
    pub fn failing_first(self, count: usize) -> Self {
        {
            let mut queued = self.queued.lock().unwrap();
            for _ in 0..count {
                queued.push_back(Err(ScoringError::Unavailable("timeout".to_string())));
            }
        }
        self
    }

    /// Answer the next call with `error`.
    pub fn failing_with(self, error: ScoringError) -> Self {
        self.queued.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl hireflow::CandidateScorer for FixedScorer {
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreReport, ScoringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.queued.lock().unwrap().pop_front();
        let score = match next {
            Some(result) => result?,
            None => self.score,
        };
        Ok(ScoreReport::new(
            score,
            json!({ "candidate": request.candidate_ref, "summary": "fixture" }),
        ))
    }
}

// ============================================================================
// TestHarness
// ============================================================================

/// Isolated environment for tracker and relay integration tests.
pub struct TestHarness {
    /// The real store; use it for seeding and assertions.
    pub sqlite: Arc<SqliteStore>,
    /// The fault-injecting wrapper every component talks to.
    pub store: Arc<FailingStore>,
    pub dispatcher: Arc<RecordingDispatcher>,
}

impl TestHarness {
    /// Create a new harness with the default change feed capacity.
    pub fn new() -> Self {
        Self::with_feed(EventChangeFeed::default())
    }

    /// Create a harness whose change feed holds only `capacity` changes.
    pub fn with_feed_capacity(capacity: usize) -> Self {
        Self::with_feed(EventChangeFeed::new(capacity))
    }

    fn with_feed(feed: EventChangeFeed) -> Self {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let sqlite = Arc::new(SqliteStore::new(db, feed));
        let store = Arc::new(FailingStore::new(sqlite.clone()));
        Self {
            sqlite,
            store,
            dispatcher: Arc::new(RecordingDispatcher::default()),
        }
    }

    /// Tracker with default settings and the recording dispatcher.
    pub fn tracker(&self) -> PipelineTracker {
        self.tracker_with(TrackerSettings::default())
    }

    pub fn tracker_with(&self, settings: TrackerSettings) -> PipelineTracker {
        PipelineTracker::new(self.store.clone())
            .with_dispatcher(self.dispatcher.clone())
            .with_settings(settings)
    }

    pub fn relay(&self) -> LiveStatusRelay {
        LiveStatusRelay::new(self.store.clone())
    }

    pub fn seed_stages(&self, stages: &[Stage]) {
        for stage in stages {
            self.sqlite.insert_stage(stage).expect("Failed to seed stage");
        }
    }

    pub fn seed_candidate(&self, candidate: PipelineCandidate) -> PipelineCandidate {
        self.sqlite
            .insert_candidate(&candidate)
            .expect("Failed to seed candidate");
        candidate
    }

    pub fn record_response(&self, event_id: &str, answer: &str) {
        self.sqlite
            .record_response(&ResponseRecord::new(event_id, Some("Why us?"), answer))
            .expect("Failed to record response");
    }

    pub async fn candidate(&self, id: &str) -> Option<PipelineCandidate> {
        self.sqlite.candidate(id).await.expect("Failed to read candidate")
    }

    pub async fn events(&self, candidate_id: &str) -> Vec<StageEvent> {
        self.sqlite
            .events_for_candidate(candidate_id)
            .await
            .expect("Failed to read events")
    }
}
