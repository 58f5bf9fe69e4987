//! Pluggable grammar source capability.
//!
//! The cache is agnostic to where grammar bytes come from; callers inject a
//! reader instead of the cache hard-wiring filesystem access.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{Result, SchemaError};

/// Reads grammar text for a source identifier.
pub trait SchemaSource {
    fn read(&self, key: &str) -> Result<String>;
}

/// Filesystem-backed source, scoped under a root directory.
#[derive(Debug, Clone)]
pub struct FsSchemaSource {
    root: PathBuf,
}

impl FsSchemaSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl SchemaSource for FsSchemaSource {
    fn read(&self, key: &str) -> Result<String> {
        let path = self.path_for(key);
        std::fs::read_to_string(&path).map_err(|source| SchemaError::SourceUnavailable {
            key: key.to_string(),
            reason: format!("{}: {source}", path.display()),
        })
    }
}

/// In-memory source for tests and embedded fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, grammar: impl Into<String>) -> Self {
        self.entries.insert(key.into(), grammar.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, grammar: impl Into<String>) {
        self.entries.insert(key.into(), grammar.into());
    }
}

impl SchemaSource for MemorySource {
    fn read(&self, key: &str) -> Result<String> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| SchemaError::SourceUnavailable {
                key: key.to_string(),
                reason: "no such grammar registered".to_string(),
            })
    }
}
