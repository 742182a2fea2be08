//! Pipeline domain records.

pub mod candidate;
pub mod event;
pub mod invitation;
pub mod response;
pub mod stage;

use thiserror::Error;

pub use candidate::{CandidateStatus, PipelineCandidate};
pub use event::{EventStatus, StageEvent};
pub use invitation::{DeliveryStatus, Invitation};
pub use response::ResponseRecord;
pub use stage::Stage;

/// A stored status string that matches none of the known variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
