//! Error types for the scoring engine

use thiserror::Error;

/// Result type for scoring operations
pub type Result<T> = std::result::Result<T, Error>;

/// Scoring errors
///
/// The first four variants form the request-rejection taxonomy: they are
/// returned to the caller before or instead of any write. The rest are
/// infrastructure failures that abort the whole operation.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller holds no active assignment for the match, or the wrong role
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Malformed outcome (wicket without type, boundary with wrong runs, ...)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unknown match, verification, entry or assignment
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violated (duplicate active assignment, repeat submission,
    /// resolving an already-verified ball)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (writer mailbox closed, reply channel dropped)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl Error {
    /// True for rejections the client may correct and resubmit;
    /// false for infrastructure failures.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::Authorization(_) | Error::Validation(_) | Error::NotFound(_) | Error::Conflict(_)
        )
    }
}
