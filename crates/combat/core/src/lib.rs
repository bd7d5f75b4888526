//! Deterministic combat rules for turn-based tap-dial encounters.
//!
//! `combat-core` defines the canonical rules (weapon bands, zone resolution,
//! damage, sessions, rewards) and exposes pure APIs that the runtime and
//! offline tools share. All session mutation flows through
//! [`engine::CombatEngine`], and supporting crates depend on the types
//! re-exported here.
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod event;
pub mod rewards;
pub mod session;
pub mod stats;
pub use combat::{
    DamageResult, EnemyStrike, InvalidAngle, WeaponBands, ZONE_COUNT, Zone, ZoneHitResult,
    apply_damage, calculate_attack_damage, calculate_defense, calculate_enemy_strike,
    normalize_angle, resolve_zone,
};
pub use config::{
    BandConfig, CombatConfig, ConfigError, CritConfig, DIAL_DEGREES, MaterialDropSpec,
    RewardTable, ZoneTable,
};
pub use engine::{ActionOutcome, CombatAction, CombatEngine, ExecuteError, transition};
pub use env::{CombatEnv, FixedRng, PcgRng, RngOracle, compute_seed};
pub use error::{CombatError, ErrorSeverity};
pub use event::{CombatEvent, CombatEventType};
pub use rewards::{
    MAX_MATERIAL_DROPS, MaterialDrop, RewardBreakdown, RewardError, compute_rewards,
    session_rewards,
};
pub use session::{
    CombatPhase, CombatSession, EnemyId, PlayerId, SessionBands, SessionBuilder, SessionError,
    SessionId, SessionStatus, Timestamp,
};
pub use stats::{CombatStats, Combatant};
