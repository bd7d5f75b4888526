//! Repository contract for saving and loading combat sessions.

use combat_core::{CombatSession, SessionId};

use super::Result;

/// Store for live and finished combat sessions, keyed by session id.
///
/// Writers follow load → mutate → [`save_if_version`](Self::save_if_version)
/// with the version they loaded. The check is the last line of defence
/// against a second writer; the service's per-session lock is the first.
pub trait SessionRepository: Send + Sync {
    /// Store a brand-new session. Fails with `AlreadyExists` if the id is taken.
    fn insert(&self, session: &CombatSession) -> Result<()>;

    /// Load a session by id.
    fn load(&self, id: SessionId) -> Result<Option<CombatSession>>;

    /// Replace a session only if the stored copy still has `expected_version`.
    fn save_if_version(&self, session: &CombatSession, expected_version: u64) -> Result<()>;

    /// Remove a session. Returns whether anything was removed.
    fn delete(&self, id: SessionId) -> Result<bool>;

    /// Check if a session exists
    fn exists(&self, id: SessionId) -> bool;

    /// List all stored session ids
    fn list_ids(&self) -> Result<Vec<SessionId>> {
        Ok(vec![])
    }
}
