use serde::{Deserialize, Serialize};

/// Indexer Result
pub type IndexerResult<T> = Result<T, IndexerError>;

/// Indexer Errors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum IndexerError {
    /// A referenced entity is not in the store
    NotFound { kind: String, id: String },
    /// An entity with the same id was already created
    AlreadyExists { kind: String, id: String },
    /// A contract view call reverted or returned undecodable data
    ExternalReadFailed(String),
    /// Decoding issue
    DecodingError(String),
    /// Unknown/Custom error
    Custom(String),
}

impl IndexerError {
    pub fn not_found<S: AsRef<str>>(kind: &str, id: S) -> Self {
        IndexerError::NotFound {
            kind: kind.to_string(),
            id: id.as_ref().to_string(),
        }
    }

    pub fn already_exists<S: AsRef<str>>(kind: &str, id: S) -> Self {
        IndexerError::AlreadyExists {
            kind: kind.to_string(),
            id: id.as_ref().to_string(),
        }
    }

    /// Errors that only skip the current input and never halt the stream.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            IndexerError::NotFound { .. }
                | IndexerError::AlreadyExists { .. }
                | IndexerError::ExternalReadFailed(_)
        )
    }
}

impl std::fmt::Display for IndexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexerError::NotFound { kind, id } => write!(f, "{} {} not found", kind, id),
            IndexerError::AlreadyExists { kind, id } => {
                write!(f, "{} {} already exists", kind, id)
            }
            IndexerError::ExternalReadFailed(msg) => write!(f, "external read failed: {}", msg),
            IndexerError::DecodingError(msg) => write!(f, "decoding error: {}", msg),
            IndexerError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for IndexerError {}

pub fn read_err<S: AsRef<str>>(s: S) -> IndexerError {
    IndexerError::ExternalReadFailed(s.as_ref().to_string())
}
