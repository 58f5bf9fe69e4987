//! Batching queue for candidate tag edits.
//!
//! Entries move Pending -> Applied or Pending -> Failed, and Failed entries
//! can be retried back to Pending. Applied is terminal. The queue does not
//! validate anything itself: validation needs a document snapshot the queue
//! does not own, so callers validate and then mark entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::QueueError;
use crate::passage::{Tag, TextRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagState {
    Pending,
    Applied,
    Failed,
}

/// A candidate tag waiting in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTag {
    pub id: u64,
    pub tag_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub passage_id: String,
    pub range: TextRange,
    pub state: TagState,
}

impl QueuedTag {
    /// Materialize this entry as a document tag with the given tag id.
    pub fn to_tag(&self, tag_id: impl Into<String>) -> Tag {
        Tag {
            id: tag_id.into(),
            tag_type: self.tag_type.clone(),
            range: self.range,
            attributes: self.attributes.clone(),
        }
    }
}

/// Per-bucket entry counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub applied: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct TagQueue {
    entries: Vec<QueuedTag>,
    next_id: u64,
}

impl TagQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a candidate edit; returns its id. Ids are unique per queue.
    pub fn add(
        &mut self,
        tag_type: impl Into<String>,
        attributes: BTreeMap<String, String>,
        passage_id: impl Into<String>,
        range: TextRange,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(QueuedTag {
            id,
            tag_type: tag_type.into(),
            attributes,
            passage_id: passage_id.into(),
            range,
            state: TagState::Pending,
        });
        id
    }

    pub fn mark_applied(&mut self, id: u64) -> Result<(), QueueError> {
        self.transition(id, TagState::Applied)
    }

    pub fn mark_failed(&mut self, id: u64) -> Result<(), QueueError> {
        self.transition(id, TagState::Failed)
    }

    /// Move one failed entry back to pending.
    pub fn retry(&mut self, id: u64) -> Result<(), QueueError> {
        self.transition(id, TagState::Pending)
    }

    /// Move every failed entry back to pending; returns how many moved.
    pub fn retry_failed(&mut self) -> usize {
        let mut moved = 0;
        for entry in &mut self.entries {
            if entry.state == TagState::Failed {
                entry.state = TagState::Pending;
                moved += 1;
            }
        }
        moved
    }

    pub fn remove(&mut self, id: u64) -> Result<QueuedTag, QueueError> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(QueueError::UnknownId(id))?;
        Ok(self.entries.remove(position))
    }

    pub fn clear_applied(&mut self) -> usize {
        self.clear_state(TagState::Applied)
    }

    pub fn clear_failed(&mut self) -> usize {
        self.clear_state(TagState::Failed)
    }

    /// Pending entries in insertion order.
    pub fn pending(&self) -> impl Iterator<Item = &QueuedTag> {
        self.in_state(TagState::Pending)
    }

    pub fn applied(&self) -> impl Iterator<Item = &QueuedTag> {
        self.in_state(TagState::Applied)
    }

    pub fn failed(&self) -> impl Iterator<Item = &QueuedTag> {
        self.in_state(TagState::Failed)
    }

    pub fn entries(&self) -> &[QueuedTag] {
        &self.entries
    }

    pub fn state_of(&self, id: u64) -> Option<TagState> {
        self.entry(id).map(|entry| entry.state)
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.pending().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for entry in &self.entries {
            match entry.state {
                TagState::Pending => counts.pending += 1,
                TagState::Applied => counts.applied += 1,
                TagState::Failed => counts.failed += 1,
            }
        }
        counts
    }

    fn entry(&self, id: u64) -> Option<&QueuedTag> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    fn in_state(&self, state: TagState) -> impl Iterator<Item = &QueuedTag> {
        self.entries.iter().filter(move |entry| entry.state == state)
    }

    fn clear_state(&mut self, state: TagState) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.state != state);
        before - self.entries.len()
    }

    fn transition(&mut self, id: u64, to: TagState) -> Result<(), QueueError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(QueueError::UnknownId(id))?;
        let allowed = matches!(
            (entry.state, to),
            (TagState::Pending, TagState::Applied)
                | (TagState::Pending, TagState::Failed)
                | (TagState::Failed, TagState::Pending)
        );
        if !allowed {
            return Err(QueueError::InvalidTransition {
                id,
                from: entry.state,
                to,
            });
        }
        entry.state = to;
        Ok(())
    }
}
