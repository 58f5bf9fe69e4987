//! Batch application of queued tags.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use tei_model::{
    DocumentEvent, DocumentStore, Entity, EntityKind, Passage, TagQueue, TagState, TextRange,
};
use tei_schema::{CacheConfig, ConstraintCache, MemorySource};
use tei_validate::{IssueCode, Validator, apply_batch};

const GRAMMAR: &str = r#"
<grammar xmlns="http://relaxng.org/ns/structure/1.0">
  <start>
    <element name="said">
      <attribute name="who">
        <data type="IDREF"/>
      </attribute>
      <text/>
    </element>
  </start>
</grammar>
"#;

const SCHEMA_KEY: &str = "speech.rng";

fn validator() -> Validator {
    let source = MemorySource::new().with(SCHEMA_KEY, GRAMMAR);
    let cache = ConstraintCache::new(
        Box::new(source),
        CacheConfig {
            capacity: NonZeroUsize::new(4).unwrap(),
            ttl: None,
        },
    );
    Validator::new(cache)
}

fn store() -> DocumentStore {
    let mut store = DocumentStore::new();
    store
        .apply(DocumentEvent::PassageAdded {
            passage: Passage::new("p1", "a fairly long passage of narrative text"),
        })
        .unwrap();
    store
        .apply(DocumentEvent::EntityAdded {
            entity: Entity::new("char-1", "Elizabeth", EntityKind::Character),
        })
        .unwrap();
    store
}

fn who(value: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("who".to_string(), value.to_string())])
}

#[test]
fn valid_entries_apply_and_advance_the_revision() {
    let mut queue = TagQueue::new();
    let mut store = store();
    let mut validator = validator();

    let a = queue.add("said", who("#char-1"), "p1", TextRange::new(0, 6));
    let b = queue.add("said", who("char-1"), "p1", TextRange::new(8, 14));
    let start_revision = store.snapshot().revision;

    let outcome = apply_batch(&mut queue, &mut store, &mut validator, SCHEMA_KEY).unwrap();
    assert_eq!(outcome.applied, vec![a, b]);
    assert!(outcome.all_applied());
    assert_eq!(outcome.revision, start_revision + 2);

    assert_eq!(queue.state_of(a), Some(TagState::Applied));
    assert_eq!(queue.state_of(b), Some(TagState::Applied));
    assert_eq!(store.snapshot().passage("p1").unwrap().tags.len(), 2);
}

#[test]
fn invalid_entries_fail_without_blocking_the_rest() {
    let mut queue = TagQueue::new();
    let mut store = store();
    let mut validator = validator();

    let good = queue.add("said", who("#char-1"), "p1", TextRange::new(0, 6));
    let bad = queue.add("said", who("#ghost"), "p1", TextRange::new(8, 14));
    let also_good = queue.add("said", who("#char-1"), "p1", TextRange::new(16, 20));

    let outcome = apply_batch(&mut queue, &mut store, &mut validator, SCHEMA_KEY).unwrap();
    assert_eq!(outcome.applied, vec![good, also_good]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, bad);
    assert_eq!(
        outcome.failed[0].1.errors[0].code,
        IssueCode::InvalidReferenceTarget
    );
    assert_eq!(queue.state_of(bad), Some(TagState::Failed));
}

#[test]
fn each_entry_sees_the_snapshot_left_by_the_previous_one() {
    let mut queue = TagQueue::new();
    let mut store = store();
    let mut validator = validator();

    queue.add("said", who("#char-1"), "p1", TextRange::new(0, 6));
    queue.add("said", who("#char-1"), "p1", TextRange::new(8, 14));

    let outcome = apply_batch(&mut queue, &mut store, &mut validator, SCHEMA_KEY).unwrap();
    assert_eq!(outcome.applied.len(), 2);

    // Both tags landed in the same passage, so the second application
    // validated against a snapshot already holding the first tag.
    let tags = &store.snapshot().passage("p1").unwrap().tags;
    assert_eq!(tags[0].id, "tag-0");
    assert_eq!(tags[1].id, "tag-1");
}

#[test]
fn failed_entries_can_be_retried_after_the_document_changes() {
    let mut queue = TagQueue::new();
    let mut store = store();
    let mut validator = validator();

    let id = queue.add("said", who("#char-2"), "p1", TextRange::new(0, 6));
    let outcome = apply_batch(&mut queue, &mut store, &mut validator, SCHEMA_KEY).unwrap();
    assert!(outcome.applied.is_empty());
    assert_eq!(queue.state_of(id), Some(TagState::Failed));

    // Create the missing character, retry, and re-run the batch.
    store
        .apply(DocumentEvent::EntityAdded {
            entity: Entity::new("char-2", "Jane", EntityKind::Character),
        })
        .unwrap();
    assert_eq!(queue.retry_failed(), 1);

    let outcome = apply_batch(&mut queue, &mut store, &mut validator, SCHEMA_KEY).unwrap();
    assert_eq!(outcome.applied, vec![id]);
    assert_eq!(queue.state_of(id), Some(TagState::Applied));
}

#[test]
fn schema_failure_aborts_the_pass_cleanly() {
    let mut queue = TagQueue::new();
    let mut store = store();
    let mut validator = validator();

    let id = queue.add("said", who("#char-1"), "p1", TextRange::new(0, 6));
    let before = store.snapshot().revision;

    let result = apply_batch(&mut queue, &mut store, &mut validator, "missing.rng");
    assert!(result.is_err());
    assert_eq!(store.snapshot().revision, before);
    assert_eq!(queue.state_of(id), Some(TagState::Pending));
}
