use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declared value space of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// Free-form text (the fallback for untyped declarations).
    Str,
    Boolean,
    /// Must resolve to the id of an entity in the same document.
    IdRef,
    /// One of a closed set of literal values, in declaration order.
    Enumeration(Vec<String>),
}

/// A single declared attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeConstraint {
    pub name: String,
    pub value_type: AttributeType,
}

/// What an element may contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentModel {
    Empty,
    TextOnly,
    /// Child element names, in declaration order.
    ElementsOnly(Vec<String>),
    /// Text interleaved with the named child elements.
    Mixed(Vec<String>),
}

/// Everything the grammar says about one tag name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagConstraint {
    /// Attributes that must be supplied. Keyed by name; no duplicates.
    pub required: Vec<AttributeConstraint>,
    /// Attributes that may be supplied.
    pub optional: Vec<AttributeConstraint>,
    pub content: ContentModel,
}

impl TagConstraint {
    /// Look up a declared attribute, required or optional.
    pub fn attribute(&self, name: &str) -> Option<&AttributeConstraint> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .find(|attribute| attribute.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }
}

/// Normalized rule set produced by parsing one constraint grammar.
///
/// Immutable after parsing; a tag name maps to exactly one constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedConstraints {
    pub tags: BTreeMap<String, TagConstraint>,
}

impl ParsedConstraints {
    pub fn tag(&self, name: &str) -> Option<&TagConstraint> {
        self.tags.get(name)
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
