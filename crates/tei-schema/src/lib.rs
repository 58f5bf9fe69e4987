pub mod cache;
pub mod constraints;
pub mod error;
pub mod parser;
pub mod pattern;
pub mod source;

pub use cache::{CacheConfig, CacheStats, ConstraintCache};
pub use constraints::{
    AttributeConstraint, AttributeType, ContentModel, ParsedConstraints, TagConstraint,
};
pub use error::{Result, SchemaError};
pub use parser::parse_grammar;
pub use pattern::{NameClass, Pattern};
pub use source::{FsSchemaSource, MemorySource, SchemaSource};
