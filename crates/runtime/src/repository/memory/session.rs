//! In-memory SessionRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use combat_core::{CombatSession, SessionId};

use crate::repository::{RepositoryError, Result, SessionRepository};

/// In-memory implementation of SessionRepository.
///
/// Sessions live in a map guarded by an `RwLock`; the version check and the
/// write happen under the same write guard.
pub struct InMemorySessionRepo {
    sessions: RwLock<HashMap<SessionId, CombatSession>>,
}

impl InMemorySessionRepo {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySessionRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRepository for InMemorySessionRepo {
    fn insert(&self, session: &CombatSession) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        if sessions.contains_key(&session.id()) {
            return Err(RepositoryError::AlreadyExists(session.id()));
        }
        sessions.insert(session.id(), session.clone());
        Ok(())
    }

    fn load(&self, id: SessionId) -> Result<Option<CombatSession>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(sessions.get(&id).cloned())
    }

    fn save_if_version(&self, session: &CombatSession, expected_version: u64) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        let found = sessions.get(&session.id()).map(CombatSession::version);
        if found != Some(expected_version) {
            return Err(RepositoryError::VersionConflict {
                session_id: session.id(),
                expected: expected_version,
                found,
            });
        }

        sessions.insert(session.id(), session.clone());
        Ok(())
    }

    fn delete(&self, id: SessionId) -> Result<bool> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(sessions.remove(&id).is_some())
    }

    fn exists(&self, id: SessionId) -> bool {
        self.sessions
            .read()
            .map(|sessions| sessions.contains_key(&id))
            .unwrap_or(false)
    }

    fn list_ids(&self) -> Result<Vec<SessionId>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut ids: Vec<SessionId> = sessions.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
