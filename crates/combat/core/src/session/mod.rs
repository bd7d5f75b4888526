//! Authoritative state of one encounter.
//!
//! [`CombatSession`] is the aggregate root: participant snapshots, HP, turn
//! bookkeeping and status. Readers query it freely; only the engine mutates
//! it, and once the status is terminal nothing but the store may touch it.

mod errors;

pub use errors::SessionError;

use uuid::Uuid;

use crate::combat::WeaponBands;
use crate::config::BandConfig;
use crate::stats::{CombatStats, Combatant};

// ============================================================================
// Identifiers and time
// ============================================================================

/// Opaque unique identifier of a combat session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Fresh random (v4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(value).map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Reference to the player record owned by the profile service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PlayerId(pub u64);

/// Reference to the enemy record owned by the content service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EnemyId(pub u64);

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

impl core::fmt::Display for EnemyId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "enemy#{}", self.0)
    }
}

/// Wall-clock instant in milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    pub const fn saturating_add_millis(self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }
}

// ============================================================================
// Status and phase
// ============================================================================

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SessionStatus {
    #[default]
    Active,
    Victory,
    Defeat,
    Abandoned,
}

impl SessionStatus {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

/// Which half of a turn the session is waiting for.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CombatPhase {
    #[default]
    PlayerAttack,
    PlayerDefense,
}

impl CombatPhase {
    pub const fn next(self) -> Self {
        match self {
            CombatPhase::PlayerAttack => CombatPhase::PlayerDefense,
            CombatPhase::PlayerDefense => CombatPhase::PlayerAttack,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Dial layouts cached at session creation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionBands {
    /// Player taps during `PlayerAttack`, from the player's attack accuracy.
    pub player_attack: WeaponBands,
    /// Player taps during `PlayerDefense`, from the player's defense accuracy.
    pub player_defense: WeaponBands,
    /// Enemy counter-strike taps, from the enemy's attack accuracy.
    pub enemy_attack: WeaponBands,
}

impl SessionBands {
    pub fn compute(player: &CombatStats, enemy: &CombatStats, config: &BandConfig) -> Self {
        Self {
            player_attack: WeaponBands::from_accuracy(player.attack_accuracy, config),
            player_defense: WeaponBands::from_accuracy(player.defense_accuracy, config),
            enemy_attack: WeaponBands::from_accuracy(enemy.attack_accuracy, config),
        }
    }

    /// Bands the player taps on during `phase`.
    pub fn for_phase(&self, phase: CombatPhase) -> &WeaponBands {
        match phase {
            CombatPhase::PlayerAttack => &self.player_attack,
            CombatPhase::PlayerDefense => &self.player_defense,
        }
    }
}

/// One player-vs-enemy encounter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatSession {
    pub(crate) id: SessionId,
    pub(crate) player_id: PlayerId,
    pub(crate) enemy_id: EnemyId,
    pub(crate) enemy_level: u32,
    pub(crate) status: SessionStatus,
    pub(crate) turn_number: u32,
    pub(crate) current_phase: CombatPhase,
    pub(crate) player_hp: f64,
    pub(crate) enemy_hp: f64,
    pub(crate) player_stats: CombatStats,
    pub(crate) enemy_stats: CombatStats,
    pub(crate) bands: SessionBands,
    pub(crate) seed: u64,
    pub(crate) version: u64,
    pub(crate) created_at: Timestamp,
    pub(crate) last_action_at: Timestamp,
    pub(crate) expires_at: Option<Timestamp>,
    pub(crate) ttl_millis: Option<u64>,
}

impl CombatSession {
    /// Start building a session for the given participants.
    pub fn builder(
        player_id: PlayerId,
        enemy_id: EnemyId,
        player_stats: CombatStats,
        enemy_stats: CombatStats,
    ) -> SessionBuilder {
        SessionBuilder::new(player_id, enemy_id, player_stats, enemy_stats)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn enemy_id(&self) -> EnemyId {
        self.enemy_id
    }

    pub fn enemy_level(&self) -> u32 {
        self.enemy_level
    }

    /// Stored status, without lazy expiry. See [`Self::effective_status`].
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Status as every reader must see it: an Active session past
    /// `expires_at` counts as Abandoned.
    pub fn effective_status(&self, now: Timestamp) -> SessionStatus {
        if self.status == SessionStatus::Active && self.is_expired(now) {
            SessionStatus::Abandoned
        } else {
            self.status
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        self.effective_status(now) == SessionStatus::Active
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn current_phase(&self) -> CombatPhase {
        self.current_phase
    }

    pub fn player_hp(&self) -> f64 {
        self.player_hp
    }

    pub fn enemy_hp(&self) -> f64 {
        self.enemy_hp
    }

    pub fn hp(&self, combatant: Combatant) -> f64 {
        match combatant {
            Combatant::Player => self.player_hp,
            Combatant::Enemy => self.enemy_hp,
        }
    }

    pub fn player_stats(&self) -> &CombatStats {
        &self.player_stats
    }

    pub fn enemy_stats(&self) -> &CombatStats {
        &self.enemy_stats
    }

    pub fn bands(&self) -> &SessionBands {
        &self.bands
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Incremented by every mutation; the optimistic-concurrency token.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn last_action_at(&self) -> Timestamp {
        self.last_action_at
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    /// Checks the invariants a stored session must satisfy.
    ///
    /// Used by stores after deserializing untrusted bytes.
    pub fn is_consistent(&self) -> bool {
        let hp_in_range = |hp: f64, max: f64| hp.is_finite() && (0.0..=max).contains(&hp);
        let bands_ok = self.bands.player_attack.is_partition()
            && self.bands.player_defense.is_partition()
            && self.bands.enemy_attack.is_partition();
        let status_ok = match self.status {
            SessionStatus::Active => self.player_hp > 0.0 && self.enemy_hp > 0.0,
            SessionStatus::Victory => self.enemy_hp <= 0.0,
            SessionStatus::Defeat => self.player_hp <= 0.0,
            SessionStatus::Abandoned => true,
        };

        hp_in_range(self.player_hp, self.player_stats.max_hp)
            && hp_in_range(self.enemy_hp, self.enemy_stats.max_hp)
            && self.turn_number >= 1
            && bands_ok
            && status_ok
    }
}

/// Builder for [`CombatSession`].
#[derive(Clone, Debug)]
pub struct SessionBuilder {
    id: Option<SessionId>,
    player_id: PlayerId,
    enemy_id: EnemyId,
    enemy_level: u32,
    player_stats: CombatStats,
    enemy_stats: CombatStats,
    seed: u64,
    created_at: Timestamp,
    ttl_millis: Option<u64>,
}

impl SessionBuilder {
    fn new(
        player_id: PlayerId,
        enemy_id: EnemyId,
        player_stats: CombatStats,
        enemy_stats: CombatStats,
    ) -> Self {
        Self {
            id: None,
            player_id,
            enemy_id,
            enemy_level: 1,
            player_stats,
            enemy_stats,
            seed: 0,
            created_at: Timestamp::default(),
            ttl_millis: None,
        }
    }

    /// Use a caller-chosen id instead of a fresh v4 UUID.
    pub fn id(mut self, id: SessionId) -> Self {
        self.id = Some(id);
        self
    }

    /// Enemy level used for rewards. Level 0 is stored as 1.
    pub fn enemy_level(mut self, level: u32) -> Self {
        self.enemy_level = level.max(1);
        self
    }

    /// RNG seed for crit rolls and enemy taps.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn created_at(mut self, now: Timestamp) -> Self {
        self.created_at = now;
        self
    }

    /// Idle lifetime: the session expires this long after creation or the
    /// last accepted action.
    pub fn ttl_millis(mut self, ttl: Option<u64>) -> Self {
        self.ttl_millis = ttl;
        self
    }

    /// Validate the stat snapshots, compute every band set once, and start
    /// the session at full HP in `PlayerAttack` of turn 1.
    pub fn build(self, bands: &BandConfig) -> Result<CombatSession, SessionError> {
        self.player_stats.validate(Combatant::Player)?;
        self.enemy_stats.validate(Combatant::Enemy)?;

        let session_bands = SessionBands::compute(&self.player_stats, &self.enemy_stats, bands);

        Ok(CombatSession {
            id: self.id.unwrap_or_default(),
            player_id: self.player_id,
            enemy_id: self.enemy_id,
            enemy_level: self.enemy_level,
            status: SessionStatus::Active,
            turn_number: 1,
            current_phase: CombatPhase::PlayerAttack,
            player_hp: self.player_stats.max_hp,
            enemy_hp: self.enemy_stats.max_hp,
            player_stats: self.player_stats,
            enemy_stats: self.enemy_stats,
            bands: session_bands,
            seed: self.seed,
            version: 0,
            created_at: self.created_at,
            last_action_at: self.created_at,
            expires_at: self
                .ttl_millis
                .map(|ttl| self.created_at.saturating_add_millis(ttl)),
            ttl_millis: self.ttl_millis,
        })
    }
}
