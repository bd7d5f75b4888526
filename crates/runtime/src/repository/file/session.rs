//! File-based SessionRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use combat_core::{CombatSession, SessionId};

use crate::repository::{RepositoryError, Result, SessionRepository};

/// File-based implementation of SessionRepository.
///
/// Stores sessions as individual bincode files indexed by session id.
///
/// # File Format
///
/// Sessions are stored as `session_{uuid}.bin` in bincode format. Writes go
/// to a temp file first and are renamed into place, so a crash never leaves
/// a half-written session behind.
pub struct FileSessionRepository {
    base_dir: PathBuf,
    // Serializes version check + write within this process.
    write_lock: Mutex<()>,
}

impl FileSessionRepository {
    /// Create a new file-based session repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the path to a session file.
    fn session_path(&self, id: SessionId) -> PathBuf {
        self.base_dir.join(format!("session_{}.bin", id))
    }

    fn read(&self, id: SessionId) -> Result<Option<CombatSession>> {
        let path = self.session_path(id);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
        let session: CombatSession = bincode::deserialize(&bytes)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        if session.id() != id || !session.is_consistent() {
            return Err(RepositoryError::CorruptedData(format!(
                "{} does not hold a valid session",
                path.display()
            )));
        }

        Ok(Some(session))
    }

    fn write(&self, session: &CombatSession) -> Result<()> {
        let path = self.session_path(session.id());
        let temp_path = path.with_extension("bin.tmp");

        let bytes = bincode::serialize(session)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;
        fs::rename(&temp_path, &path).map_err(RepositoryError::Io)?;

        tracing::debug!(
            "Saved session[{}] v{} to {}",
            session.id(),
            session.version(),
            path.display()
        );

        Ok(())
    }
}

impl SessionRepository for FileSessionRepository {
    fn insert(&self, session: &CombatSession) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        if self.session_path(session.id()).exists() {
            return Err(RepositoryError::AlreadyExists(session.id()));
        }
        self.write(session)
    }

    fn load(&self, id: SessionId) -> Result<Option<CombatSession>> {
        let session = self.read(id)?;
        if session.is_some() {
            tracing::debug!("Loaded session[{}]", id);
        }
        Ok(session)
    }

    fn save_if_version(&self, session: &CombatSession, expected_version: u64) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        let found = self.read(session.id())?.map(|stored| stored.version());
        if found != Some(expected_version) {
            return Err(RepositoryError::VersionConflict {
                session_id: session.id(),
                expected: expected_version,
                found,
            });
        }

        self.write(session)
    }

    fn delete(&self, id: SessionId) -> Result<bool> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        let path = self.session_path(id);
        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path).map_err(RepositoryError::Io)?;
        tracing::debug!("Deleted session[{}]", id);
        Ok(true)
    }

    fn exists(&self, id: SessionId) -> bool {
        self.session_path(id).exists()
    }

    fn list_ids(&self) -> Result<Vec<SessionId>> {
        let mut ids = Vec::new();

        let entries = fs::read_dir(&self.base_dir).map_err(RepositoryError::Io)?;

        for entry in entries {
            let entry = entry.map_err(RepositoryError::Io)?;
            let path = entry.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(id_str) = filename
                    .strip_prefix("session_")
                    .and_then(|s| s.strip_suffix(".bin"))
                && let Ok(id) = SessionId::parse(id_str)
            {
                ids.push(id);
            }
        }

        ids.sort_unstable();
        Ok(ids)
    }
}
