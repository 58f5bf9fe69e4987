use thiserror::Error;

use crate::queue::TagState;

/// Precondition violation while applying or replaying a document event.
///
/// The store guarantees that when one of these is returned, the document
/// snapshot and revision are unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("passage already exists: {0}")]
    DuplicatePassage(String),

    #[error("tag already exists in passage {passage_id}: {tag_id}")]
    DuplicateTag { passage_id: String, tag_id: String },

    #[error("entity already exists: {0}")]
    DuplicateEntity(String),

    #[error("passage not found: {0}")]
    PassageNotFound(String),

    #[error("tag not found in passage {passage_id}: {tag_id}")]
    TagNotFound { passage_id: String, tag_id: String },

    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("relationship not found: {source_id} -> {target_id} ({kind})")]
    RelationshipNotFound {
        source_id: String,
        target_id: String,
        kind: String,
    },

    #[error("relationship endpoint does not resolve to an entity: {0}")]
    DanglingRelationship(String),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("revision out of range: {0}")]
    RevisionOutOfRange(u64),
}

/// Misuse of the tag queue state machine.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("unknown queue entry: {0}")]
    UnknownId(u64),

    #[error("entry {id} cannot transition from {from:?} to {to:?}")]
    InvalidTransition { id: u64, from: TagState, to: TagState },
}

pub type Result<T> = std::result::Result<T, StoreError>;
