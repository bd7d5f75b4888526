//! Error types for action execution.

use crate::combat::InvalidAngle;
use crate::error::{CombatError, ErrorSeverity};
use crate::session::{CombatPhase, SessionId, SessionStatus};

/// Errors surfaced while executing an action through the combat engine.
///
/// Every variant is raised before any field of the session is touched.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ExecuteError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidAngle),

    #[error("session {session_id} is not active (status: {status})")]
    SessionNotActive {
        session_id: SessionId,
        status: SessionStatus,
    },

    #[error("action for {submitted} submitted while session expects {expected}")]
    PhaseMismatch {
        expected: CombatPhase,
        submitted: CombatPhase,
    },
}

impl CombatError for ExecuteError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::SessionNotActive { .. } => "SESSION_NOT_ACTIVE",
            Self::PhaseMismatch { .. } => "PHASE_MISMATCH",
        }
    }
}
