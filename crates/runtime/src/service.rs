//! Session orchestration facade.
//!
//! [`CombatService`] is what adapters call. Every mutating operation takes
//! the per-session writer lock, loads the session, lets the engine work on
//! it, stores it with a version check and only then publishes events. The
//! engine never sees the store and the store never sees the rules.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use combat_core::{
    CombatAction, CombatEngine, CombatEnv, CombatEvent, CombatEventType, CombatPhase,
    CombatSession, CombatStats, DamageResult, EnemyId, EnemyStrike, PcgRng, PlayerId,
    RewardBreakdown, RngOracle, SessionId, SessionStatus, Timestamp, ZoneHitResult,
    compute_rewards, session_rewards,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedMutexGuard, broadcast};
use tracing::{debug, info, warn};

use crate::api::{Result, RuntimeError, TapProvider};
use crate::clock::{Clock, SystemClock};
use crate::config::{RuntimeConfig, StorageConfig};
use crate::events::EventBus;
use crate::repository::{
    FileSessionRepository, InMemorySessionRepo, RepositoryError, SessionRepository,
};

/// What the caller gets back for one accepted tap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    /// Zone the player's tap landed in.
    pub zone_hit: ZoneHitResult,
    pub damage: DamageResult,
    /// The enemy's counter-strike, for defense actions.
    pub enemy_strike: Option<EnemyStrike>,
    pub events: Vec<CombatEvent>,
    /// Session as stored after the action.
    pub session: CombatSession,
}

/// One async mutex per session id: the single-writer guarantee.
///
/// Entries live only while someone holds or waits for them, so unknown ids
/// and sessions nobody touches any more do not pile up.
#[derive(Default)]
struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    async fn acquire(&self, id: SessionId) -> SessionLease<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(id).or_default())
        };
        SessionLease {
            locks: self,
            id,
            guard: Some(lock.lock_owned().await),
        }
    }

    fn release(&self, id: SessionId) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Handles are only cloned under this map lock, so a count of one
        // means no holder and no waiter is left.
        if locks.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Held writer lock for one session; drops its map entry when unused.
struct SessionLease<'a> {
    locks: &'a SessionLocks,
    id: SessionId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionLease<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(self.id);
    }
}

/// Async facade over the combat rules and the session store.
pub struct CombatService {
    config: RuntimeConfig,
    repository: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn RngOracle>,
    seeds: Mutex<StdRng>,
    /// Seeds standalone reward queries so they never draw from `seeds`.
    preview_seed: u64,
    locks: SessionLocks,
    events: EventBus,
}

impl CombatService {
    /// Create a new service builder
    pub fn builder() -> CombatServiceBuilder {
        CombatServiceBuilder::new()
    }

    /// Service with default collaborators for `config`.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Receiver for every event the service publishes.
    pub fn subscribe_events(&self) -> broadcast::Receiver<CombatEvent> {
        self.events.subscribe_all()
    }

    /// Start an encounter against a level 1 enemy.
    pub async fn create_session(
        &self,
        player_id: PlayerId,
        enemy_id: EnemyId,
        player_stats: CombatStats,
        enemy_stats: CombatStats,
    ) -> Result<CombatSession> {
        self.create_session_with_level(player_id, enemy_id, player_stats, enemy_stats, 1)
            .await
    }

    /// Start an encounter; `enemy_level` scales the rewards.
    pub async fn create_session_with_level(
        &self,
        player_id: PlayerId,
        enemy_id: EnemyId,
        player_stats: CombatStats,
        enemy_stats: CombatStats,
        enemy_level: u32,
    ) -> Result<CombatSession> {
        let session = CombatSession::builder(player_id, enemy_id, player_stats, enemy_stats)
            .enemy_level(enemy_level)
            .seed(self.next_seed())
            .created_at(self.clock.now())
            .ttl_millis(self.config.session_ttl_millis())
            .build(&self.config.combat.bands)?;

        self.repository.insert(&session)?;

        info!(
            "Session {} created: {} vs {} (level {})",
            session.id(),
            player_id,
            enemy_id,
            session.enemy_level()
        );
        self.events.publish(CombatEvent::new(
            session.id(),
            session.turn_number(),
            CombatEventType::SessionStarted {
                player_id,
                enemy_id,
            },
        ));

        Ok(session)
    }

    /// Resolve one tap for the session's current phase.
    pub async fn submit_action(
        &self,
        session_id: SessionId,
        phase: CombatPhase,
        tap_angle_degrees: f64,
    ) -> Result<ActionReport> {
        let _lease = self.locks.acquire(session_id).await;

        let now = self.clock.now();
        let mut session = self.load_live(session_id, now)?;
        let expected = session.version();

        let env = CombatEnv::new(&self.config.combat, self.rng.as_ref(), now);
        let action = CombatAction::new(phase, tap_angle_degrees);
        let outcome = match CombatEngine::new(&mut session).execute(&env, &action) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!("Rejected {} for session {}: {}", phase, session_id, err);
                return Err(err.into());
            }
        };

        self.store(&session, expected)?;

        debug!(
            "Session {} turn {} {}: zone {} ({:.1} dmg), hp {:.1}/{:.1}",
            session_id,
            session.turn_number(),
            phase,
            outcome.zone_hit().zone,
            outcome.damage.final_damage,
            outcome.player_hp,
            outcome.enemy_hp
        );
        if outcome.is_terminal() {
            info!(
                "Session {} ended in {} on turn {}",
                session_id,
                outcome.status,
                outcome.turn_number
            );
        }

        for event in &outcome.events {
            self.events.publish(event.clone());
        }

        Ok(ActionReport {
            zone_hit: outcome.zone_hit(),
            damage: outcome.damage,
            enemy_strike: outcome.enemy_strike,
            events: outcome.events,
            session,
        })
    }

    /// Abandon an encounter. Retreating from a finished session is a no-op.
    pub async fn retreat(&self, session_id: SessionId) -> Result<CombatSession> {
        let _lease = self.locks.acquire(session_id).await;

        let now = self.clock.now();
        let mut session = self.load_live(session_id, now)?;
        let expected = session.version();

        if let Some(event) = CombatEngine::new(&mut session).retreat(now) {
            self.store(&session, expected)?;
            info!(
                "Session {} abandoned by retreat on turn {}",
                session_id,
                session.turn_number()
            );
            self.events.publish(event);
        }

        Ok(session)
    }

    /// Current session with lazy expiry applied.
    pub async fn session(&self, session_id: SessionId) -> Result<CombatSession> {
        let _lease = self.locks.acquire(session_id).await;

        self.load_live(session_id, self.clock.now())
    }

    /// Rewards for an enemy level and outcome, without touching any session.
    ///
    /// The same level and outcome always yield the same breakdown for one
    /// service, and asking never shifts the seeds of later sessions.
    pub fn compute_rewards(
        &self,
        enemy_level: u32,
        outcome: SessionStatus,
    ) -> Result<RewardBreakdown> {
        Ok(compute_rewards(
            enemy_level,
            outcome,
            &self.config.combat.rewards,
            self.rng.as_ref(),
            self.preview_seed,
            u64::from(enemy_level),
        )?)
    }

    /// Compute the rewards of a finished session and remove it from the store.
    pub async fn claim_rewards(&self, session_id: SessionId) -> Result<RewardBreakdown> {
        let _lease = self.locks.acquire(session_id).await;

        let session = self.load_live(session_id, self.clock.now())?;
        let rewards = session_rewards(&session, &self.config.combat.rewards, self.rng.as_ref())?;

        self.repository.delete(session_id)?;

        info!(
            "Session {} rewards claimed ({}): {} gold, {} xp, {} material stacks",
            session_id,
            rewards.outcome,
            rewards.gold,
            rewards.experience,
            rewards.materials.len()
        );
        self.events.publish(CombatEvent::new(
            session_id,
            session.turn_number(),
            CombatEventType::RewardsClaimed {
                gold: rewards.gold,
                experience: rewards.experience,
            },
        ));

        Ok(rewards)
    }

    /// Remove a finished session without granting rewards.
    pub async fn discard(&self, session_id: SessionId) -> Result<()> {
        let _lease = self.locks.acquire(session_id).await;

        let session = self.load_live(session_id, self.clock.now())?;
        if session.status() == SessionStatus::Active {
            return Err(RuntimeError::SessionStillActive { session_id });
        }

        self.repository.delete(session_id)?;
        debug!("Session {} discarded", session_id);
        Ok(())
    }

    /// Drive a session with taps from `provider` until it ends, the provider
    /// closes, or `max_actions` taps have been submitted.
    pub async fn run_encounter(
        &self,
        session_id: SessionId,
        provider: &dyn TapProvider,
        max_actions: usize,
    ) -> Result<CombatSession> {
        let mut session = self.session(session_id).await?;

        for _ in 0..max_actions {
            if session.status() != SessionStatus::Active {
                break;
            }

            let tap = match provider.provide_tap(&session).await {
                Ok(tap) => tap,
                Err(RuntimeError::TapProviderClosed) => {
                    debug!("Tap provider closed for session {}", session_id);
                    break;
                }
                Err(err) => return Err(err),
            };

            let report = self
                .submit_action(session_id, session.current_phase(), tap)
                .await?;
            session = report.session;
        }

        Ok(session)
    }

    /// Load a session and persist lazy expiry if it is due.
    fn load_live(&self, session_id: SessionId, now: Timestamp) -> Result<CombatSession> {
        let mut session = self
            .repository
            .load(session_id)?
            .ok_or(RuntimeError::SessionNotFound(session_id))?;
        let expected = session.version();

        if let Some(event) = CombatEngine::new(&mut session).expire(now) {
            self.store(&session, expected)?;
            info!("Session {} expired after inactivity", session_id);
            self.events.publish(event);
        }

        Ok(session)
    }

    fn store(&self, session: &CombatSession, expected_version: u64) -> Result<()> {
        match self.repository.save_if_version(session, expected_version) {
            Ok(()) => Ok(()),
            Err(err @ RepositoryError::VersionConflict { .. }) => {
                warn!("Lost write for session {}: {}", session.id(), err);
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn next_seed(&self) -> u64 {
        self.seeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_u64()
    }
}

/// Builder for [`CombatService`].
pub struct CombatServiceBuilder {
    config: RuntimeConfig,
    repository: Option<Arc<dyn SessionRepository>>,
    clock: Option<Arc<dyn Clock>>,
    rng: Option<Arc<dyn RngOracle>>,
}

impl CombatServiceBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            repository: None,
            clock: None,
            rng: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this store instead of the one `config.storage` describes
    pub fn repository(mut self, repository: Arc<dyn SessionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Replace the wall clock (defaults to [`SystemClock`])
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the roll oracle (defaults to [`PcgRng`])
    pub fn rng(mut self, rng: Arc<dyn RngOracle>) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn build(self) -> Result<CombatService> {
        self.config.combat.validate()?;

        let repository: Arc<dyn SessionRepository> = match self.repository {
            Some(repository) => repository,
            None => match &self.config.storage {
                StorageConfig::Memory => Arc::new(InMemorySessionRepo::new()),
                StorageConfig::File(dir) => Arc::new(FileSessionRepository::new(dir)?),
            },
        };

        let seeds = match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let preview_seed = self.config.rng_seed.unwrap_or_else(rand::random);

        info!(
            "Combat service ready (storage: {:?}, session ttl: {:?})",
            self.config.storage, self.config.session_ttl
        );

        Ok(CombatService {
            events: EventBus::with_capacity(self.config.event_buffer_size),
            repository,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            rng: self.rng.unwrap_or_else(|| Arc::new(PcgRng)),
            seeds: Mutex::new(seeds),
            preview_seed,
            locks: SessionLocks::default(),
            config: self.config,
        })
    }
}
