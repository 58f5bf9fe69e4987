//! On-disk document format and conversion to/from the event-sourced store.
//!
//! A document file is plain JSON holding passages, entities grouped by kind,
//! and relationships. Loading rebuilds a [`DocumentStore`] by replaying the
//! contents as events, so every precondition the store enforces is also
//! enforced on load.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tei_model::{
    DocumentEvent, DocumentSnapshot, DocumentStore, Entity, EntityKind, Passage, Relationship,
    TextRange,
};

/// One entity as stored on disk. The kind is implied by which collection
/// the record sits in, so it is not repeated per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EntityRecord {
    fn into_entity(self, kind: EntityKind) -> Entity {
        Entity {
            id: self.id,
            name: self.name,
            kind,
            notes: self.notes,
        }
    }

    fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id.clone(),
            name: entity.name.clone(),
            notes: entity.notes.clone(),
        }
    }
}

/// The serialized document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFile {
    #[serde(default)]
    pub passages: Vec<Passage>,
    #[serde(default)]
    pub characters: Vec<EntityRecord>,
    #[serde(default)]
    pub places: Vec<EntityRecord>,
    #[serde(default)]
    pub organizations: Vec<EntityRecord>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl DocumentFile {
    /// Capture the current state of a snapshot for saving.
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Self {
        Self {
            passages: snapshot.passages.clone(),
            characters: snapshot.characters.iter().map(EntityRecord::from_entity).collect(),
            places: snapshot.places.iter().map(EntityRecord::from_entity).collect(),
            organizations: snapshot
                .organizations
                .iter()
                .map(EntityRecord::from_entity)
                .collect(),
            relationships: snapshot.relationships.clone(),
        }
    }

    /// Replay the file into a fresh store.
    ///
    /// Entities land first so relationship endpoints resolve, then passages
    /// (tags included), then relationships.
    pub fn into_store(self) -> Result<DocumentStore> {
        let mut store = DocumentStore::new();
        for (kind, records) in [
            (EntityKind::Character, self.characters),
            (EntityKind::Place, self.places),
            (EntityKind::Organization, self.organizations),
        ] {
            for record in records {
                let entity = record.into_entity(kind);
                store
                    .apply(DocumentEvent::EntityAdded { entity })
                    .context("load entity")?;
            }
        }
        for passage in self.passages {
            store
                .apply(DocumentEvent::PassageAdded { passage })
                .context("load passage")?;
        }
        for relationship in self.relationships {
            store
                .apply(DocumentEvent::RelationshipAdded { relationship })
                .context("load relationship")?;
        }
        Ok(store)
    }
}

/// One tag candidate as supplied in a tags file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRequest {
    pub tag_type: String,
    pub passage_id: String,
    pub range: TextRange,
    #[serde(default)]
    pub attributes: std::collections::BTreeMap<String, String>,
}

/// Read and parse a document file.
pub fn load_document(path: &Path) -> Result<DocumentFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read document {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse document {}", path.display()))
}

/// Write a document file as pretty-printed JSON.
pub fn save_document(path: &Path, document: &DocumentFile) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, format!("{json}\n"))
        .with_context(|| format!("write document {}", path.display()))
}

/// Read and parse a tags file (a JSON array of tag requests).
pub fn load_tag_requests(path: &Path) -> Result<Vec<TagRequest>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read tags {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse tags {}", path.display()))
}
