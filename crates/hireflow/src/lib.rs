pub mod broadcast;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;
pub mod relay;
pub mod scoring;
pub mod store;
pub mod tracker;

pub use broadcast::{ChangeKind, EventChange, EventChangeFeed, EventSubscription};
pub use catalog::{display_label, resolve_adjacent_stage, Direction, StageCatalog, StageSnapshot};
pub use config::{load_config, load_config_from_str, Config};
pub use db::Database;
pub use error::{ConfigError, HireflowError, Result};
pub use model::{
    CandidateStatus, DeliveryStatus, EventStatus, Invitation, PipelineCandidate, ResponseRecord,
    Stage, StageEvent,
};
pub use notify::{LogDispatcher, NoopDispatcher, NotificationDispatcher, StageNotice};
pub use relay::{CandidateWatch, LiveStatusRelay, StatusView};
pub use scoring::{CandidateScorer, ScoreReport, ScoreRequest, ScoringError};
pub use store::{PipelineStore, SqliteStore, StoreError, WriteBatch};
pub use tracker::{
    AdvanceOutcome, BulkMoveReport, PipelineError, PipelineTracker, Progress, ProgressScope,
    ScheduleRequest, TrackerSettings,
};

use std::sync::Arc;

/// A tracker and relay sharing one SQLite store, built from config.
pub struct Pipeline {
    pub store: Arc<SqliteStore>,
    pub tracker: PipelineTracker,
    pub relay: LiveStatusRelay,
}

impl Pipeline {
    /// Opens the configured database and wires the components together.
    pub fn open(config: &Config) -> Result<Self> {
        let path = config
            .database
            .resolved_path()
            .ok_or_else(|| ConfigError::Validation {
                message: "no database path configured and no home directory found".to_string(),
            })?;
        let db = Database::open(&path)?;
        Self::from_database(db, config)
    }

    /// Wires the components over an already opened database.
    pub fn from_database(db: Database, config: &Config) -> Result<Self> {
        let feed = EventChangeFeed::new(config.relay.channel_capacity);
        let store = Arc::new(SqliteStore::new(db, feed));
        let tracker = PipelineTracker::new(store.clone())
            .with_dispatcher(Arc::new(LogDispatcher))
            .with_settings(config.tracker_settings()?);
        let relay =
            LiveStatusRelay::new(store.clone()).with_live_window(config.relay.live_window());
        Ok(Self {
            store,
            tracker,
            relay,
        })
    }
}
