//! Collaborator seams the engine reads from while resolving an action.
//!
//! [`CombatEnv`] bundles the balance tables, the randomness source and the
//! current time so the engine never reaches for globals.

pub mod rng;

pub use rng::{FixedRng, PcgRng, RngOracle, compute_seed, roll};

use crate::config::CombatConfig;
use crate::session::Timestamp;

/// Read-only inputs for one engine call.
#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    pub config: &'a CombatConfig,
    pub rng: &'a dyn RngOracle,
    pub now: Timestamp,
}

impl<'a> CombatEnv<'a> {
    pub fn new(config: &'a CombatConfig, rng: &'a dyn RngOracle, now: Timestamp) -> Self {
        Self { config, rng, now }
    }
}

impl core::fmt::Debug for CombatEnv<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CombatEnv")
            .field("config", self.config)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}
