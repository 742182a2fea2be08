use crate::model::{EventStatus, Invitation, PipelineCandidate, StageEvent};

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone)]
pub enum Write {
    /// Overwrite a candidate if its stored version is still `expected_version`.
    UpdateCandidate {
        candidate: PipelineCandidate,
        expected_version: i64,
    },
    InsertEvent(StageEvent),
    /// Overwrite an event if its stored status is still `expected_status`.
    UpdateEvent {
        event: StageEvent,
        expected_status: EventStatus,
    },
    InsertInvitation(Invitation),
    UpdateInvitation(Invitation),
}

/// Writes committed together in one transaction: all or nothing.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_candidate(
        &mut self,
        candidate: PipelineCandidate,
        expected_version: i64,
    ) -> &mut Self {
        self.writes.push(Write::UpdateCandidate {
            candidate,
            expected_version,
        });
        self
    }

    pub fn insert_event(&mut self, event: StageEvent) -> &mut Self {
        self.writes.push(Write::InsertEvent(event));
        self
    }

    pub fn update_event(&mut self, event: StageEvent, expected_status: EventStatus) -> &mut Self {
        self.writes.push(Write::UpdateEvent {
            event,
            expected_status,
        });
        self
    }

    pub fn insert_invitation(&mut self, invitation: Invitation) -> &mut Self {
        self.writes.push(Write::InsertInvitation(invitation));
        self
    }

    pub fn update_invitation(&mut self, invitation: Invitation) -> &mut Self {
        self.writes.push(Write::UpdateInvitation(invitation));
        self
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Ids of the candidates this batch touches.
    pub fn candidate_ids(&self) -> impl Iterator<Item = &str> {
        self.writes.iter().filter_map(|w| match w {
            Write::UpdateCandidate { candidate, .. } => Some(candidate.id.as_str()),
            _ => None,
        })
    }
}

impl IntoIterator for WriteBatch {
    type Item = Write;
    type IntoIter = std::vec::IntoIter<Write>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.into_iter()
    }
}
