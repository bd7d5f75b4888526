//! Combat resolution rules.
//!
//! Pure functions for turning a tap on the dial into damage. All functions
//! here are side-effect free; the engine composes them and owns mutation.
//!
//! - [`bands`]: accuracy stat to five dial arcs (the weapon band model)
//! - [`zone`]: tap angle to zone, plus the zone-1 crit roll
//! - [`damage`]: zone result to damage, block split and self-injury

pub mod bands;
pub mod damage;
pub mod zone;

pub use bands::WeaponBands;
pub use damage::{
    DamageResult, EnemyStrike, apply_damage, calculate_attack_damage, calculate_defense,
    calculate_enemy_strike, zone_damage,
};
pub use zone::{InvalidAngle, ZONE_COUNT, Zone, ZoneHitResult, normalize_angle, resolve_zone};
