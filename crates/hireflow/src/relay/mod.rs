//! Live status relay.
//!
//! Keeps observer views of candidates' stage events in sync with committed
//! changes published by the store.

mod live;
mod view;

pub use live::{
    CandidateWatch, LiveStatusRelay, RelayError, SubscriptionGuard, SubscriptionRegistry,
    WatchUpdate,
};
pub use view::{Reconcile, StatusView};
