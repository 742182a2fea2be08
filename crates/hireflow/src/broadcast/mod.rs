//! Broadcasting of committed pipeline changes.

pub mod event_changes;

pub use event_changes::{
    ChangeKind, EventChange, EventChangeFeed, EventSubscription, SubscriptionError,
};
