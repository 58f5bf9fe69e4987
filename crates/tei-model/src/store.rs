//! Event-sourced document store.
//!
//! The store owns the append-only event log and derives every snapshot by
//! replay from the empty document. Undo and redo recompute the snapshot by
//! replaying a prefix of the log rather than inverting individual events,
//! so the snapshot can never drift from the recorded history.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKind, Relationship};
use crate::error::{Result, StoreError};
use crate::event::DocumentEvent;
use crate::passage::Passage;

/// Read-only view of the document at a revision.
///
/// Snapshots are plain data: callers may clone and hold one across later
/// edits, and the held copy stays valid and unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub passages: Vec<Passage>,
    pub characters: Vec<Entity>,
    pub places: Vec<Entity>,
    pub organizations: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub revision: u64,
}

impl DocumentSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn passage(&self, id: &str) -> Option<&Passage> {
        self.passages.iter().find(|passage| passage.id == id)
    }

    /// Entities of one kind, in declaration order.
    pub fn entities_of(&self, kind: EntityKind) -> &[Entity] {
        match kind {
            EntityKind::Character => &self.characters,
            EntityKind::Place => &self.places,
            EntityKind::Organization => &self.organizations,
        }
    }

    /// Exact-id lookup across all entity collections, characters first.
    pub fn find_entity(&self, id: &str) -> Option<&Entity> {
        EntityKind::ALL
            .iter()
            .flat_map(|kind| self.entities_of(*kind))
            .find(|entity| entity.id == id)
    }

    fn entities_of_mut(&mut self, kind: EntityKind) -> &mut Vec<Entity> {
        match kind {
            EntityKind::Character => &mut self.characters,
            EntityKind::Place => &mut self.places,
            EntityKind::Organization => &mut self.organizations,
        }
    }

    /// Apply one event in place, checking its preconditions first.
    ///
    /// Does not touch `revision`; the store assigns revisions.
    fn apply_event(&mut self, event: &DocumentEvent) -> Result<()> {
        match event {
            DocumentEvent::PassageAdded { passage } => {
                if self.passage(&passage.id).is_some() {
                    return Err(StoreError::DuplicatePassage(passage.id.clone()));
                }
                self.passages.push(passage.clone());
            }
            DocumentEvent::TagAdded { passage_id, tag } => {
                let passage = self
                    .passages
                    .iter_mut()
                    .find(|p| p.id == *passage_id)
                    .ok_or_else(|| StoreError::PassageNotFound(passage_id.clone()))?;
                if passage.tags.iter().any(|existing| existing.id == tag.id) {
                    return Err(StoreError::DuplicateTag {
                        passage_id: passage_id.clone(),
                        tag_id: tag.id.clone(),
                    });
                }
                passage.tags.push(tag.clone());
            }
            DocumentEvent::TagRemoved { passage_id, tag_id } => {
                let passage = self
                    .passages
                    .iter_mut()
                    .find(|p| p.id == *passage_id)
                    .ok_or_else(|| StoreError::PassageNotFound(passage_id.clone()))?;
                let before = passage.tags.len();
                passage.tags.retain(|tag| tag.id != *tag_id);
                if passage.tags.len() == before {
                    return Err(StoreError::TagNotFound {
                        passage_id: passage_id.clone(),
                        tag_id: tag_id.clone(),
                    });
                }
            }
            DocumentEvent::EntityAdded { entity } => {
                if self.find_entity(&entity.id).is_some() {
                    return Err(StoreError::DuplicateEntity(entity.id.clone()));
                }
                self.entities_of_mut(entity.kind).push(entity.clone());
            }
            DocumentEvent::EntityUpdated { entity } => {
                let slot = self
                    .entities_of_mut(entity.kind)
                    .iter_mut()
                    .find(|existing| existing.id == entity.id)
                    .ok_or_else(|| StoreError::EntityNotFound(entity.id.clone()))?;
                *slot = entity.clone();
            }
            DocumentEvent::EntityRemoved { kind, entity_id } => {
                let dangling = self
                    .relationships
                    .iter()
                    .any(|rel| rel.source_id == *entity_id || rel.target_id == *entity_id);
                if dangling {
                    return Err(StoreError::DanglingRelationship(entity_id.clone()));
                }
                let entities = self.entities_of_mut(*kind);
                let before = entities.len();
                entities.retain(|entity| entity.id != *entity_id);
                if entities.len() == before {
                    return Err(StoreError::EntityNotFound(entity_id.clone()));
                }
            }
            DocumentEvent::RelationshipAdded { relationship } => {
                for endpoint in [&relationship.source_id, &relationship.target_id] {
                    if self.find_entity(endpoint).is_none() {
                        return Err(StoreError::DanglingRelationship(endpoint.clone()));
                    }
                }
                self.relationships.push(relationship.clone());
            }
            DocumentEvent::RelationshipRemoved {
                source_id,
                target_id,
                kind,
            } => {
                let before = self.relationships.len();
                self.relationships.retain(|rel| {
                    !(rel.source_id == *source_id
                        && rel.target_id == *target_id
                        && rel.kind == *kind)
                });
                if self.relationships.len() == before {
                    return Err(StoreError::RelationshipNotFound {
                        source_id: source_id.clone(),
                        target_id: target_id.clone(),
                        kind: kind.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// One committed entry in the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub revision: u64,
    pub event: DocumentEvent,
}

/// Current position within the undo/redo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    /// Revision of the snapshot currently exposed.
    pub current: u64,
    /// Earliest reachable revision (the empty document).
    pub min: u64,
    /// Latest revision present in the log (redo ceiling).
    pub max: u64,
}

/// Sole owner of passages, entities, and the event log.
///
/// `apply` is not reentrant-safe; callers must serialize edits on a single
/// logical thread of control.
#[derive(Debug, Default)]
pub struct DocumentStore {
    events: Vec<LoggedEvent>,
    /// Number of log entries reflected in `snapshot`.
    cursor: usize,
    next_revision: u64,
    snapshot: DocumentSnapshot,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            cursor: 0,
            next_revision: 1,
            snapshot: DocumentSnapshot::empty(),
        }
    }

    /// The current read-only snapshot.
    pub fn snapshot(&self) -> &DocumentSnapshot {
        &self.snapshot
    }

    /// Entries of the log that are currently applied (the undo range).
    pub fn applied_events(&self) -> &[LoggedEvent] {
        &self.events[..self.cursor]
    }

    /// Validate and commit one event, returning the new revision.
    ///
    /// Applying after an undo discards the redo tail; revision numbers are
    /// drawn from a monotonic counter and never reused, even then.
    pub fn apply(&mut self, event: DocumentEvent) -> Result<u64> {
        let mut next = self.snapshot.clone();
        next.apply_event(&event)?;

        self.events.truncate(self.cursor);
        let revision = self.next_revision;
        self.next_revision += 1;
        self.events.push(LoggedEvent { revision, event });
        self.cursor = self.events.len();
        next.revision = revision;
        self.snapshot = next;
        Ok(revision)
    }

    /// Step back to `target` (default: one event back). `target` 0 is the
    /// empty document.
    pub fn undo(&mut self, target: Option<u64>) -> Result<u64> {
        if self.cursor == 0 {
            return Err(StoreError::NothingToUndo);
        }
        let target = match target {
            Some(revision) => revision,
            None => {
                if self.cursor >= 2 {
                    self.events[self.cursor - 2].revision
                } else {
                    0
                }
            }
        };
        let index = self.index_for_revision(target)?;
        if index >= self.cursor {
            return Err(StoreError::RevisionOutOfRange(target));
        }
        self.replay_to(index)?;
        Ok(self.snapshot.revision)
    }

    /// Step forward to `target` (default: one event forward).
    pub fn redo(&mut self, target: Option<u64>) -> Result<u64> {
        if self.cursor >= self.events.len() {
            return Err(StoreError::NothingToRedo);
        }
        let target = match target {
            Some(revision) => revision,
            None => self.events[self.cursor].revision,
        };
        let index = self.index_for_revision(target)?;
        if index <= self.cursor {
            return Err(StoreError::RevisionOutOfRange(target));
        }
        self.replay_to(index)?;
        Ok(self.snapshot.revision)
    }

    pub fn history_state(&self) -> HistoryState {
        HistoryState {
            current: self.snapshot.revision,
            min: 0,
            max: self.events.last().map(|entry| entry.revision).unwrap_or(0),
        }
    }

    /// Replay an event sequence from the empty document.
    ///
    /// Used by tests and loaders to check that a log reproduces a snapshot.
    pub fn replay(events: &[LoggedEvent]) -> Result<DocumentSnapshot> {
        let mut snapshot = DocumentSnapshot::empty();
        for entry in events {
            snapshot.apply_event(&entry.event)?;
            snapshot.revision = entry.revision;
        }
        Ok(snapshot)
    }

    /// Map a revision to the log prefix length that produces it.
    fn index_for_revision(&self, revision: u64) -> Result<usize> {
        if revision == 0 {
            return Ok(0);
        }
        self.events
            .iter()
            .position(|entry| entry.revision == revision)
            .map(|position| position + 1)
            .ok_or(StoreError::RevisionOutOfRange(revision))
    }

    /// Rebuild the snapshot from `events[0..count]`.
    fn replay_to(&mut self, count: usize) -> Result<()> {
        let snapshot = Self::replay(&self.events[..count])?;
        self.cursor = count;
        self.snapshot = snapshot;
        Ok(())
    }
}
