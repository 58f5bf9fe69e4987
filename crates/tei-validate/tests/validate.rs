//! Validator behavior against grammar constraints and the entity graph.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use tei_model::{DocumentEvent, DocumentStore, Entity, EntityKind, Passage, TextRange};
use tei_schema::{CacheConfig, ConstraintCache, MemorySource};
use tei_validate::{Fix, IssueCode, TagCandidate, Validator};

const SPEECH_GRAMMAR: &str = r#"
<grammar xmlns="http://relaxng.org/ns/structure/1.0">
  <start>
    <element name="p">
      <zeroOrMore>
        <choice>
          <ref name="said"/>
          <ref name="placeName"/>
        </choice>
      </zeroOrMore>
      <text/>
    </element>
  </start>
  <define name="said">
    <element name="said">
      <attribute name="who">
        <data type="IDREF"/>
      </attribute>
      <optional>
        <attribute name="aloud">
          <data type="boolean"/>
        </attribute>
      </optional>
      <optional>
        <attribute name="direct">
          <choice>
            <value>direct</value>
            <value>reported</value>
          </choice>
        </attribute>
      </optional>
      <text/>
    </element>
  </define>
  <define name="placeName">
    <element name="placeName">
      <attribute name="ref">
        <data type="IDREF"/>
      </attribute>
      <text/>
    </element>
  </define>
</grammar>
"#;

const SCHEMA_KEY: &str = "speech.rng";

fn validator() -> Validator {
    let source = MemorySource::new().with(SCHEMA_KEY, SPEECH_GRAMMAR);
    let cache = ConstraintCache::new(
        Box::new(source),
        CacheConfig {
            capacity: NonZeroUsize::new(4).unwrap(),
            ttl: None,
        },
    );
    Validator::new(cache)
}

fn store_with_characters() -> DocumentStore {
    let mut store = DocumentStore::new();
    store
        .apply(DocumentEvent::PassageAdded {
            passage: Passage::new("p1", "\"It is a truth universally acknowledged...\""),
        })
        .unwrap();
    store
        .apply(DocumentEvent::EntityAdded {
            entity: Entity::new("char-1", "Elizabeth Bennet", EntityKind::Character),
        })
        .unwrap();
    store
        .apply(DocumentEvent::EntityAdded {
            entity: Entity::new("char-2", "Mr. Darcy", EntityKind::Character),
        })
        .unwrap();
    store
}

fn candidate(tag_type: &str, attributes: &[(&str, &str)]) -> TagCandidate {
    TagCandidate {
        tag_type: tag_type.to_string(),
        attributes: attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        passage_id: "p1".to_string(),
        range: TextRange::new(0, 10),
    }
}

#[test]
fn undeclared_tag_is_invalid_with_no_fixes() {
    let mut validator = validator();
    let store = store_with_characters();

    let report = validator
        .validate(&candidate("stage", &[]), store.snapshot(), SCHEMA_KEY)
        .unwrap();
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, IssueCode::UnknownElement);
    assert!(report.fixes.is_empty());
}

#[test]
fn missing_required_idref_suggests_existing_entities() {
    let mut validator = validator();
    let store = store_with_characters();

    let report = validator
        .validate(&candidate("said", &[]), store.snapshot(), SCHEMA_KEY)
        .unwrap();
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, IssueCode::MissingRequiredAttribute);
    assert_eq!(
        report.fixes,
        vec![Fix::AddAttribute {
            attribute: "who".to_string(),
            suggested_values: vec!["char-1".to_string(), "char-2".to_string()],
        }]
    );
}

#[test]
fn resolvable_reference_is_valid() {
    let mut validator = validator();
    let store = store_with_characters();

    let report = validator
        .validate(
            &candidate("said", &[("who", "#char-1")]),
            store.snapshot(),
            SCHEMA_KEY,
        )
        .unwrap();
    assert!(report.valid);
    assert!(report.errors.is_empty());
    assert!(report.fixes.is_empty());
}

#[test]
fn dangling_reference_offers_change_fix_with_prefixed_ids() {
    let mut validator = validator();
    let store = store_with_characters();

    let report = validator
        .validate(
            &candidate("said", &[("who", "#ghost")]),
            store.snapshot(),
            SCHEMA_KEY,
        )
        .unwrap();
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, IssueCode::InvalidReferenceTarget);
    match &report.fixes[0] {
        Fix::ChangeAttribute {
            attribute,
            suggested_values,
        } => {
            assert_eq!(attribute, "who");
            assert!(suggested_values.contains(&"#char-1".to_string()));
            assert!(suggested_values.contains(&"#char-2".to_string()));
        }
        other => panic!("expected ChangeAttribute fix, got {other:?}"),
    }
}

#[test]
fn dangling_reference_with_no_entities_of_kind_offers_create_fix() {
    let mut validator = validator();
    let store = store_with_characters();

    // The document has characters but no places.
    let report = validator
        .validate(
            &candidate("placeName", &[("ref", "#longbourn")]),
            store.snapshot(),
            SCHEMA_KEY,
        )
        .unwrap();
    assert!(!report.valid);
    assert_eq!(
        report.fixes,
        vec![Fix::CreateEntity {
            kind: EntityKind::Place,
            suggested_name: "longbourn".to_string(),
        }]
    );
}

#[test]
fn undeclared_attribute_is_a_warning_not_an_error() {
    let mut validator = validator();
    let store = store_with_characters();

    let report = validator
        .validate(
            &candidate("said", &[("who", "#char-1"), ("rend", "italic")]),
            store.snapshot(),
            SCHEMA_KEY,
        )
        .unwrap();
    assert!(report.valid);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].message.contains("rend"));
}

#[test]
fn boolean_and_enumeration_values_are_checked() {
    let mut validator = validator();
    let store = store_with_characters();

    let report = validator
        .validate(
            &candidate("said", &[("who", "#char-1"), ("aloud", "yes")]),
            store.snapshot(),
            SCHEMA_KEY,
        )
        .unwrap();
    assert!(!report.valid);
    assert_eq!(report.errors[0].code, IssueCode::InvalidAttributeValue);

    let report = validator
        .validate(
            &candidate("said", &[("who", "#char-1"), ("direct", "whispered")]),
            store.snapshot(),
            SCHEMA_KEY,
        )
        .unwrap();
    assert!(!report.valid);
    assert_eq!(report.errors[0].code, IssueCode::InvalidAttributeValue);

    let report = validator
        .validate(
            &candidate(
                "said",
                &[("who", "#char-1"), ("aloud", "true"), ("direct", "reported")],
            ),
            store.snapshot(),
            SCHEMA_KEY,
        )
        .unwrap();
    assert!(report.valid);
}

#[test]
fn missing_required_fix_comes_before_value_errors() {
    let mut validator = validator();
    let store = store_with_characters();

    let report = validator
        .validate(
            &candidate("said", &[("direct", "whispered")]),
            store.snapshot(),
            SCHEMA_KEY,
        )
        .unwrap();
    assert_eq!(report.errors.len(), 2);
    assert!(matches!(report.fixes[0], Fix::AddAttribute { .. }));
}

#[test]
fn report_serializes_for_editor_consumption() {
    let mut validator = validator();
    let store = store_with_characters();

    let report = validator
        .validate(
            &candidate("said", &[("who", "#ghost")]),
            store.snapshot(),
            SCHEMA_KEY,
        )
        .unwrap();
    insta::assert_json_snapshot!(report, @r###"
    {
      "valid": false,
      "errors": [
        {
          "code": "invalid_reference_target",
          "message": "\"#ghost\" does not reference any entity in the document",
          "severity": "error"
        }
      ],
      "warnings": [],
      "fixes": [
        {
          "fix": "change_attribute",
          "attribute": "who",
          "suggested_values": [
            "#char-1",
            "#char-2"
          ]
        }
      ]
    }
    "###);
}

#[test]
fn unknown_passage_and_bad_range_are_errors() {
    let mut validator = validator();
    let store = store_with_characters();

    let mut bad_passage = candidate("said", &[("who", "#char-1")]);
    bad_passage.passage_id = "p9".to_string();
    let report = validator
        .validate(&bad_passage, store.snapshot(), SCHEMA_KEY)
        .unwrap();
    assert_eq!(report.errors[0].code, IssueCode::UnknownPassage);

    let mut bad_range = candidate("said", &[("who", "#char-1")]);
    bad_range.range = TextRange::new(0, 100_000);
    let report = validator
        .validate(&bad_range, store.snapshot(), SCHEMA_KEY)
        .unwrap();
    assert_eq!(report.errors[0].code, IssueCode::RangeOutOfBounds);
}

#[test]
fn validation_does_not_mutate_the_document() {
    let mut validator = validator();
    let store = store_with_characters();
    let before = store.snapshot().clone();

    validator
        .validate(&candidate("said", &[]), store.snapshot(), SCHEMA_KEY)
        .unwrap();
    assert_eq!(store.snapshot(), &before);
    assert_eq!(store.history_state().current, before.revision);
}

#[test]
fn missing_schema_surfaces_source_error() {
    let mut validator = validator();
    let store = store_with_characters();

    let result = validator.validate(&candidate("said", &[]), store.snapshot(), "nope.rng");
    assert!(result.is_err());
}
