//! Error types raised by repository implementations.

use combat_core::SessionId;
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("session repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("session {0} already exists")]
    AlreadyExists(SessionId),

    /// The stored version no longer matches the one the writer loaded.
    /// `found` is `None` when the session disappeared in between.
    #[error("session {session_id} changed concurrently (expected version {expected}, found {found:?})")]
    VersionConflict {
        session_id: SessionId,
        expected: u64,
        found: Option<u64>,
    },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
