//! Asynchronous abstraction for sourcing player taps.
//!
//! Runtime users plug in [`TapProvider`] implementations so an encounter can
//! be driven by human input, scripted fixtures, or a random tapper.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use combat_core::{CombatSession, DIAL_DEGREES};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::errors::{Result, RuntimeError};

/// Trait for providing the next tap angle for a session.
///
/// Different implementations can handle:
/// - Player input (from UI/CLI)
/// - Scripted/replayed taps
/// - Testing fixtures
#[async_trait]
pub trait TapProvider: Send + Sync {
    /// Provide a tap angle in degrees for the session's current phase.
    ///
    /// Returning [`RuntimeError::TapProviderClosed`] ends the encounter loop
    /// without touching the session.
    async fn provide_tap(&self, session: &CombatSession) -> Result<f64>;
}

/// Replays a fixed list of taps, then reports itself closed.
pub struct ScriptedTaps {
    taps: Mutex<VecDeque<f64>>,
}

impl ScriptedTaps {
    pub fn new(taps: impl IntoIterator<Item = f64>) -> Self {
        Self {
            taps: Mutex::new(taps.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.taps.lock().map(|taps| taps.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TapProvider for ScriptedTaps {
    async fn provide_tap(&self, _session: &CombatSession) -> Result<f64> {
        let mut taps = self
            .taps
            .lock()
            .map_err(|_| RuntimeError::TapProviderClosed)?;
        taps.pop_front().ok_or(RuntimeError::TapProviderClosed)
    }
}

/// Taps uniformly at random around the dial.
pub struct RandomTaps {
    rng: Mutex<StdRng>,
}

impl RandomTaps {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

#[async_trait]
impl TapProvider for RandomTaps {
    async fn provide_tap(&self, _session: &CombatSession) -> Result<f64> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| RuntimeError::TapProviderClosed)?;
        Ok(rng.gen_range(0.0..DIAL_DEGREES))
    }
}
