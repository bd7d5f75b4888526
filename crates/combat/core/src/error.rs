//! Common error infrastructure for combat-core.
//!
//! Domain-specific errors (`ExecuteError`, `SessionError`, `RewardError`,
//! `ConfigError`) live next to the code that raises them. This module holds
//! the shared classification used by adapters to map them onto responses.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the same request may succeed on retry (store conflicts)
/// - **Validation**: the client sent something invalid; retrying unchanged fails again
/// - **Internal**: an invariant was broken and should be investigated
/// - **Fatal**: the engine cannot run with the current configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Client errors map to 4xx-style responses in a transport adapter.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for the Display/Error impl
/// - Classify severity by recoverability, not by impact
/// - Error codes are stable SCREAMING_SNAKE identifiers for clients and metrics
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
