//! Runtime configuration and environment loading.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use combat_core::CombatConfig;

/// Where sessions are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StorageConfig {
    /// Process-local map; sessions vanish on restart.
    #[default]
    Memory,
    /// One bincode file per session under this directory.
    File(PathBuf),
}

/// Configuration for [`CombatService`](crate::CombatService).
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    /// Idle lifetime of a session. `None` disables expiry.
    pub session_ttl: Option<Duration>,
    pub event_buffer_size: usize,
    /// Seed for session seeds. `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
    pub storage: StorageConfig,
}

impl RuntimeConfig {
    pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(15 * 60);
    pub const DEFAULT_EVENT_BUFFER: usize = 100;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `COMBAT_SESSION_TTL_SECS` - Idle session lifetime, `0` disables expiry (default: 900)
    /// - `COMBAT_EVENT_BUFFER` - Event channel capacity (default: 100)
    /// - `COMBAT_RNG_SEED` - Fixed seed for reproducible sessions (default: random)
    /// - `COMBAT_DATA_DIR` - Store sessions as files in this directory (default: in memory)
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = read_env::<u64>("COMBAT_SESSION_TTL_SECS") {
            config.session_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(capacity) = read_env::<usize>("COMBAT_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }

        config.rng_seed = read_env::<u64>("COMBAT_RNG_SEED");

        if let Ok(dir) = env::var("COMBAT_DATA_DIR")
            && !dir.is_empty()
        {
            config.storage = StorageConfig::File(PathBuf::from(dir));
        }

        config
    }

    pub fn with_combat(mut self, combat: CombatConfig) -> Self {
        self.combat = combat;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// TTL in the millisecond resolution sessions store.
    pub fn session_ttl_millis(&self) -> Option<u64> {
        self.session_ttl
            .map(|ttl| u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX))
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            session_ttl: Some(Self::DEFAULT_SESSION_TTL),
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER,
            rng_seed: None,
            storage: StorageConfig::Memory,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
