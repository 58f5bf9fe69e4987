//! DocumentStore event log, replay, and undo/redo behavior.

use std::collections::BTreeMap;

use tei_model::{
    DocumentEvent, DocumentStore, Entity, EntityKind, Passage, Relationship, StoreError, Tag,
    TextRange,
};

fn passage_event(id: &str, content: &str) -> DocumentEvent {
    DocumentEvent::PassageAdded {
        passage: Passage::new(id, content),
    }
}

fn character_event(id: &str, name: &str) -> DocumentEvent {
    DocumentEvent::EntityAdded {
        entity: Entity::new(id, name, EntityKind::Character),
    }
}

fn tag_event(passage_id: &str, tag_id: &str) -> DocumentEvent {
    let mut attributes = BTreeMap::new();
    attributes.insert("who".to_string(), "#char-1".to_string());
    DocumentEvent::TagAdded {
        passage_id: passage_id.to_string(),
        tag: Tag {
            id: tag_id.to_string(),
            tag_type: "said".to_string(),
            range: TextRange::new(0, 5),
            attributes,
        },
    }
}

#[test]
fn revisions_increase_from_one() {
    let mut store = DocumentStore::new();
    assert_eq!(store.apply(passage_event("p1", "text")).unwrap(), 1);
    assert_eq!(store.apply(character_event("char-1", "Lizzy")).unwrap(), 2);
    assert_eq!(store.snapshot().revision, 2);

    let history = store.history_state();
    assert_eq!(history.current, 2);
    assert_eq!(history.min, 0);
    assert_eq!(history.max, 2);
}

#[test]
fn replay_reproduces_snapshot() {
    let mut store = DocumentStore::new();
    store.apply(passage_event("p1", "some text")).unwrap();
    store.apply(character_event("char-1", "Lizzy")).unwrap();
    store.apply(tag_event("p1", "t1")).unwrap();

    let replayed = DocumentStore::replay(store.applied_events()).unwrap();
    assert_eq!(&replayed, store.snapshot());
}

#[test]
fn failed_apply_leaves_store_unchanged() {
    let mut store = DocumentStore::new();
    store.apply(passage_event("p1", "text")).unwrap();
    let before = store.snapshot().clone();

    let err = store.apply(passage_event("p1", "again")).unwrap_err();
    assert!(matches!(err, StoreError::DuplicatePassage(_)));
    assert_eq!(store.snapshot(), &before);
    assert_eq!(store.history_state().current, 1);

    let err = store
        .apply(DocumentEvent::TagRemoved {
            passage_id: "p1".to_string(),
            tag_id: "missing".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::TagNotFound { .. }));
    assert_eq!(store.snapshot(), &before);
}

#[test]
fn relationship_endpoints_must_exist() {
    let mut store = DocumentStore::new();
    store.apply(character_event("char-1", "Lizzy")).unwrap();

    let err = store
        .apply(DocumentEvent::RelationshipAdded {
            relationship: Relationship {
                source_id: "char-1".to_string(),
                target_id: "char-9".to_string(),
                kind: "sibling-of".to_string(),
            },
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::DanglingRelationship(_)));
}

#[test]
fn entity_with_relationships_cannot_be_removed() {
    let mut store = DocumentStore::new();
    store.apply(character_event("char-1", "Lizzy")).unwrap();
    store.apply(character_event("char-2", "Jane")).unwrap();
    store
        .apply(DocumentEvent::RelationshipAdded {
            relationship: Relationship {
                source_id: "char-1".to_string(),
                target_id: "char-2".to_string(),
                kind: "sibling-of".to_string(),
            },
        })
        .unwrap();

    let err = store
        .apply(DocumentEvent::EntityRemoved {
            kind: EntityKind::Character,
            entity_id: "char-2".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, StoreError::DanglingRelationship(_)));
}

#[test]
fn undo_then_redo_restores_snapshot() {
    let mut store = DocumentStore::new();
    store.apply(passage_event("p1", "text")).unwrap();
    store.apply(character_event("char-1", "Lizzy")).unwrap();
    store.apply(tag_event("p1", "t1")).unwrap();
    let before = store.snapshot().clone();

    assert_eq!(store.undo(None).unwrap(), 2);
    assert!(store.snapshot().passage("p1").unwrap().tags.is_empty());
    assert_eq!(store.redo(None).unwrap(), 3);
    assert_eq!(store.snapshot(), &before);
}

#[test]
fn undo_to_empty_document() {
    let mut store = DocumentStore::new();
    store.apply(passage_event("p1", "text")).unwrap();
    store.apply(character_event("char-1", "Lizzy")).unwrap();

    assert_eq!(store.undo(Some(0)).unwrap(), 0);
    assert!(store.snapshot().passages.is_empty());
    assert!(store.snapshot().characters.is_empty());
    assert_eq!(store.history_state().max, 2);

    assert_eq!(store.redo(Some(2)).unwrap(), 2);
    assert_eq!(store.snapshot().characters.len(), 1);
}

#[test]
fn undo_redo_bounds_are_errors() {
    let mut store = DocumentStore::new();
    assert!(matches!(store.undo(None), Err(StoreError::NothingToUndo)));
    assert!(matches!(store.redo(None), Err(StoreError::NothingToRedo)));

    store.apply(passage_event("p1", "text")).unwrap();
    assert!(matches!(store.redo(None), Err(StoreError::NothingToRedo)));
    assert!(matches!(
        store.undo(Some(7)),
        Err(StoreError::RevisionOutOfRange(7))
    ));
}

#[test]
fn apply_after_undo_truncates_redo_tail_and_never_reuses_revisions() {
    let mut store = DocumentStore::new();
    store.apply(passage_event("p1", "text")).unwrap();
    store.apply(character_event("char-1", "Lizzy")).unwrap();
    store.apply(character_event("char-2", "Jane")).unwrap();

    store.undo(Some(1)).unwrap();
    let revision = store.apply(character_event("char-3", "Darcy")).unwrap();
    // Revisions 2 and 3 were abandoned by the undo; the new edit gets a
    // fresh number rather than reusing them.
    assert_eq!(revision, 4);
    assert_eq!(store.history_state().max, 4);
    assert!(matches!(store.redo(None), Err(StoreError::NothingToRedo)));

    let ids: Vec<&str> = store
        .snapshot()
        .characters
        .iter()
        .map(|entity| entity.id.as_str())
        .collect();
    assert_eq!(ids, vec!["char-3"]);
}

mod replay_property {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        AddPassage(u8),
        AddCharacter(u8),
        AddPlace(u8),
        RemoveEntity(u8),
        AddTag(u8, u8),
        RemoveTag(u8, u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4).prop_map(Op::AddPassage),
            (0u8..4).prop_map(Op::AddCharacter),
            (0u8..4).prop_map(Op::AddPlace),
            (0u8..8).prop_map(Op::RemoveEntity),
            (0u8..4, 0u8..4).prop_map(|(p, t)| Op::AddTag(p, t)),
            (0u8..4, 0u8..4).prop_map(|(p, t)| Op::RemoveTag(p, t)),
        ]
    }

    fn event_for(op: &Op) -> DocumentEvent {
        match op {
            Op::AddPassage(n) => passage_event(&format!("p{n}"), "content"),
            Op::AddCharacter(n) => character_event(&format!("char-{n}"), "Someone"),
            Op::AddPlace(n) => DocumentEvent::EntityAdded {
                entity: Entity::new(format!("place-{n}"), "Somewhere", EntityKind::Place),
            },
            Op::RemoveEntity(n) => DocumentEvent::EntityRemoved {
                kind: if n % 2 == 0 {
                    EntityKind::Character
                } else {
                    EntityKind::Place
                },
                entity_id: if n % 2 == 0 {
                    format!("char-{}", n / 2)
                } else {
                    format!("place-{}", n / 2)
                },
            },
            Op::AddTag(p, t) => DocumentEvent::TagAdded {
                passage_id: format!("p{p}"),
                tag: Tag {
                    id: format!("t{t}"),
                    tag_type: "said".to_string(),
                    range: TextRange::new(0, 3),
                    attributes: BTreeMap::new(),
                },
            },
            Op::RemoveTag(p, t) => DocumentEvent::TagRemoved {
                passage_id: format!("p{p}"),
                tag_id: format!("t{t}"),
            },
        }
    }

    proptest! {
        // Whatever subset of random edits the store accepts, replaying the
        // committed log from empty must reproduce the live snapshot.
        #[test]
        fn replay_matches_live_snapshot(ops in proptest::collection::vec(op_strategy(), 0..40)) {
            let mut store = DocumentStore::new();
            for op in &ops {
                // Rejected events must not change the log or the snapshot.
                let _ = store.apply(event_for(op));
            }
            let replayed = DocumentStore::replay(store.applied_events()).unwrap();
            prop_assert_eq!(&replayed, store.snapshot());
        }
    }
}
