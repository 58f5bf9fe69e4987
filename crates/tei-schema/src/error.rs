use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed grammar at byte {location}: {reason}")]
    Malformed { location: u64, reason: String },

    #[error("grammar XML error at byte {location}: {source}")]
    Xml {
        location: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("reference to undefined pattern: {name}")]
    UnknownRef { name: String },

    #[error("grammar has no start pattern and no defines")]
    NoStart,

    #[error("schema source unavailable for {key}: {reason}")]
    SourceUnavailable { key: String, reason: String },
}

impl SchemaError {
    pub(crate) fn malformed(location: u64, reason: impl Into<String>) -> Self {
        Self::Malformed {
            location,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
