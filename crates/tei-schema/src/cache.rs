//! Bounded LRU + TTL cache of parsed constraint grammars.
//!
//! Constructed explicitly and injected into consumers; there is no global
//! instance. The cache is not thread-safe: the core assumes one logical
//! actor, and a consuming environment that introduces real parallelism must
//! put it behind its own mutual-exclusion boundary.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Serialize;

use crate::constraints::ParsedConstraints;
use crate::error::Result;
use crate::parser::parse_grammar;
use crate::source::SchemaSource;

#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub capacity: NonZeroUsize,
    /// Entries older than this are treated as absent on lookup.
    /// `None` disables expiry.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: NonZeroUsize::new(8).expect("nonzero capacity"),
            ttl: Some(Duration::from_secs(600)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

struct CacheEntry {
    constraints: Arc<ParsedConstraints>,
    inserted: Instant,
}

pub struct ConstraintCache {
    entries: LruCache<String, CacheEntry>,
    ttl: Option<Duration>,
    source: Box<dyn SchemaSource>,
    hits: u64,
    misses: u64,
}

impl ConstraintCache {
    pub fn new(source: Box<dyn SchemaSource>, config: CacheConfig) -> Self {
        Self {
            entries: LruCache::new(config.capacity),
            ttl: config.ttl,
            source,
            hits: 0,
            misses: 0,
        }
    }

    /// Fetch the parsed constraints for a grammar source identifier.
    ///
    /// A hit refreshes recency. A miss (absent or past TTL) reads through
    /// the injected source and parses; read or parse failures propagate and
    /// leave the cache untouched. Inserting past capacity evicts the
    /// least-recently-used entry.
    pub fn get(&mut self, key: &str) -> Result<Arc<ParsedConstraints>> {
        let ttl = self.ttl;
        if let Some(entry) = self.entries.get(key) {
            let expired = ttl.is_some_and(|ttl| entry.inserted.elapsed() >= ttl);
            if !expired {
                self.hits += 1;
                return Ok(Arc::clone(&entry.constraints));
            }
            tracing::debug!(key, "constraint cache entry expired");
            self.entries.pop(key);
        }

        self.misses += 1;
        let text = self.source.read(key)?;
        let constraints = Arc::new(parse_grammar(&text)?);
        tracing::debug!(key, tags = constraints.len(), "cached parsed grammar");
        self.entries.push(
            key.to_string(),
            CacheEntry {
                constraints: Arc::clone(&constraints),
                inserted: Instant::now(),
            },
        );
        Ok(constraints)
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            capacity: self.entries.cap().get(),
            hits: self.hits,
            misses: self.misses,
        }
    }

    /// True if the key is currently cached and fresh (does not refresh
    /// recency or count as a hit).
    pub fn contains(&self, key: &str) -> bool {
        match self.entries.peek(key) {
            Some(entry) => !self
                .ttl
                .is_some_and(|ttl| entry.inserted.elapsed() >= ttl),
            None => false,
        }
    }
}

impl std::fmt::Debug for ConstraintCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintCache")
            .field("size", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .field("ttl", &self.ttl)
            .finish()
    }
}
