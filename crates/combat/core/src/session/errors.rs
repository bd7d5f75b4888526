//! Errors raised while creating a session.

use crate::error::{CombatError, ErrorSeverity};
use crate::stats::Combatant;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("{role} stat {field} is out of range (got {value})")]
    InvalidStats {
        role: Combatant,
        field: &'static str,
        value: f64,
    },
}

impl CombatError for SessionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidStats { .. } => "INVALID_STATS",
        }
    }
}
