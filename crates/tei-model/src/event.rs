use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKind, Relationship};
use crate::passage::{Passage, Tag};

/// A structural edit recorded in the document's append-only log.
///
/// Each variant carries exactly the data needed to replay it
/// deterministically from the empty document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DocumentEvent {
    PassageAdded {
        passage: Passage,
    },
    TagAdded {
        passage_id: String,
        tag: Tag,
    },
    TagRemoved {
        passage_id: String,
        tag_id: String,
    },
    EntityAdded {
        entity: Entity,
    },
    EntityUpdated {
        entity: Entity,
    },
    EntityRemoved {
        kind: EntityKind,
        entity_id: String,
    },
    RelationshipAdded {
        relationship: Relationship,
    },
    RelationshipRemoved {
        source_id: String,
        target_id: String,
        kind: String,
    },
}

impl DocumentEvent {
    /// Short label for logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentEvent::PassageAdded { .. } => "passage-added",
            DocumentEvent::TagAdded { .. } => "tag-added",
            DocumentEvent::TagRemoved { .. } => "tag-removed",
            DocumentEvent::EntityAdded { .. } => "entity-added",
            DocumentEvent::EntityUpdated { .. } => "entity-updated",
            DocumentEvent::EntityRemoved { .. } => "entity-removed",
            DocumentEvent::RelationshipAdded { .. } => "relationship-added",
            DocumentEvent::RelationshipRemoved { .. } => "relationship-removed",
        }
    }
}
