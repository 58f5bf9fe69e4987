//! Cross-reference resolution against the document's entity collections.

use tei_model::{DocumentSnapshot, Entity, EntityKind};

/// Resolve an IDREF-style attribute value to an entity.
///
/// Strips a leading `#` (the reference-prefix convention), then does an
/// exact-id lookup across characters, places, and organizations in that
/// order.
pub fn resolve<'a>(raw: &str, snapshot: &'a DocumentSnapshot) -> Option<&'a Entity> {
    let id = strip_reference_prefix(raw);
    if id.is_empty() {
        return None;
    }
    snapshot.find_entity(id)
}

/// Remove reference punctuation from an attribute value.
pub fn strip_reference_prefix(raw: &str) -> &str {
    raw.trim().trim_start_matches('#')
}

/// Which entity kind a reference attribute is expected to point at.
///
/// Unmapped tag/attribute combinations return `None`, and suggestions then
/// draw from every collection.
pub fn expected_kind(tag_type: &str, attribute: &str) -> Option<EntityKind> {
    match (tag_type, attribute) {
        ("said" | "q" | "sp", "who") => Some(EntityKind::Character),
        ("persName", "ref") => Some(EntityKind::Character),
        ("placeName", "ref") => Some(EntityKind::Place),
        ("orgName", "ref") => Some(EntityKind::Organization),
        _ => None,
    }
}

/// Candidate entities for repair suggestions, in document declaration order.
pub fn suggestion_pool<'a>(
    snapshot: &'a DocumentSnapshot,
    kind: Option<EntityKind>,
) -> Vec<&'a Entity> {
    match kind {
        Some(kind) => snapshot.entities_of(kind).iter().collect(),
        None => EntityKind::ALL
            .iter()
            .flat_map(|kind| snapshot.entities_of(*kind))
            .collect(),
    }
}
