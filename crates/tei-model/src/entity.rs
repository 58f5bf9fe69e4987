use serde::{Deserialize, Serialize};
use std::fmt;

/// Named-entity collections a document keeps alongside its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Character,
    Place,
    Organization,
}

impl EntityKind {
    /// All kinds in the order cross-reference lookups scan them.
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Character,
        EntityKind::Place,
        EntityKind::Organization,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Character => "character",
            EntityKind::Place => "place",
            EntityKind::Organization => "organization",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named entity referenced from markup via IDREF attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Identifier other markup points at (e.g. "char-1").
    pub id: String,
    /// Display name (e.g. "Elizabeth Bennet").
    pub name: String,
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            notes: None,
        }
    }
}

/// A directed, labeled link between two entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: String,
    pub target_id: String,
    /// Relationship label (e.g. "sibling-of", "located-in").
    pub kind: String,
}
