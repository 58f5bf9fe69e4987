pub mod entity;
pub mod error;
pub mod event;
pub mod passage;
pub mod queue;
pub mod store;

pub use entity::{Entity, EntityKind, Relationship};
pub use error::{QueueError, Result, StoreError};
pub use event::DocumentEvent;
pub use passage::{Passage, Tag, TextRange};
pub use queue::{QueueCounts, QueuedTag, TagQueue, TagState};
pub use store::{DocumentSnapshot, DocumentStore, HistoryState, LoggedEvent};
