//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the combat rules, the session store and tap
//! providers so adapters can bubble them up with consistent context.
use combat_core::{
    CombatError, ConfigError, ErrorSeverity, ExecuteError, RewardError, SessionError, SessionId,
};
use thiserror::Error;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    InvalidSession(#[from] SessionError),

    #[error(transparent)]
    Rewards(#[from] RewardError),

    #[error("invalid combat configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("session {session_id} is still active")]
    SessionStillActive { session_id: SessionId },

    /// Another writer stored the session between our load and our save.
    /// The caller should reload and retry.
    #[error("session {session_id} was modified concurrently (expected version {expected}, found {found:?})")]
    ConcurrentModification {
        session_id: SessionId,
        expected: u64,
        found: Option<u64>,
    },

    #[error(transparent)]
    Repository(RepositoryError),

    #[error("tap provider closed")]
    TapProviderClosed,
}

impl From<RepositoryError> for RuntimeError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::VersionConflict {
                session_id,
                expected,
                found,
            } => RuntimeError::ConcurrentModification {
                session_id,
                expected,
                found,
            },
            other => RuntimeError::Repository(other),
        }
    }
}

impl RuntimeError {
    /// True for errors caused by the request itself (4xx-style).
    pub fn is_client_error(&self) -> bool {
        self.severity().is_client_error()
    }
}

impl CombatError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::SessionNotFound(_) | Self::SessionStillActive { .. } => ErrorSeverity::Validation,
            Self::Execute(e) => e.severity(),
            Self::InvalidSession(e) => e.severity(),
            Self::Rewards(e) => e.severity(),
            Self::InvalidConfig(e) => e.severity(),
            Self::ConcurrentModification { .. } | Self::TapProviderClosed => {
                ErrorSeverity::Recoverable
            }
            Self::Repository(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "SESSION_NOT_FOUND",
            Self::Execute(e) => e.error_code(),
            Self::InvalidSession(e) => e.error_code(),
            Self::Rewards(e) => e.error_code(),
            Self::InvalidConfig(e) => e.error_code(),
            Self::SessionStillActive { .. } => "SESSION_STILL_ACTIVE",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::Repository(_) => "REPOSITORY_ERROR",
            Self::TapProviderClosed => "TAP_PROVIDER_CLOSED",
        }
    }
}
