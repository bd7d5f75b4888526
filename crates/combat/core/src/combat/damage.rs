//! Damage calculation and application.
//!
//! # Formula
//!
//! ```text
//! raw = power * zone_multiplier(zone)
//! if critical:
//!     raw *= crit_multiplier
//! ```
//!
//! A negative `raw` (the injure zone) never subtracts from the target.
//! It becomes positive damage applied to the combatant who acted.

use crate::config::ZoneTable;
use crate::stats::CombatStats;

use super::zone::ZoneHitResult;

/// Damage produced by the player's action in one phase.
///
/// Attack phase: `final_damage` is removed from the enemy and `blocked` is 0.
/// Defense phase: `final_damage` is the part of the incoming strike the
/// player takes and `blocked` the part absorbed. In both phases
/// `self_injury` is extra damage the player deals to themselves by hitting
/// the injure zone.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageResult {
    pub zone_hit: ZoneHitResult,
    pub final_damage: f64,
    pub blocked: f64,
    pub self_injury: f64,
    pub was_critical: bool,
}

impl DamageResult {
    /// Total HP the player loses from this result.
    ///
    /// Attack phase: only the self-injury. Defense phase: damage taken plus
    /// self-injury.
    pub fn player_loss(&self, defending: bool) -> f64 {
        if defending {
            self.final_damage + self.self_injury
        } else {
            self.self_injury
        }
    }
}

/// The enemy's automatic counter-strike during the defense phase.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnemyStrike {
    pub tap_angle: f64,
    pub zone_hit: ZoneHitResult,
    /// Damage heading for the player before blocking.
    pub incoming: f64,
    /// Damage the enemy dealt to itself by striking the injure zone.
    pub self_injury: f64,
}

/// Signed damage for `power` striking with `zone_hit`.
pub fn zone_damage(power: f64, zone_hit: &ZoneHitResult, zones: &ZoneTable) -> f64 {
    power * zones.multiplier(zone_hit.zone) * zone_hit.crit_factor()
}

/// Split signed damage into `(dealt to target, dealt to self)`.
#[inline]
fn split_signed(raw: f64) -> (f64, f64) {
    if raw >= 0.0 { (raw, 0.0) } else { (0.0, -raw) }
}

/// Attack phase: the player's tap against the enemy.
///
/// The enemy's defense does not mitigate a player attack; blocking only
/// happens on the player's side during the defense phase.
pub fn calculate_attack_damage(
    attacker: &CombatStats,
    zone_hit: ZoneHitResult,
    zones: &ZoneTable,
) -> DamageResult {
    let (dealt, self_injury) = split_signed(zone_damage(attacker.attack_power, &zone_hit, zones));

    DamageResult {
        zone_hit,
        final_damage: dealt,
        blocked: 0.0,
        self_injury,
        was_critical: zone_hit.is_critical,
    }
}

/// The enemy's strike, computed with the same formula as a player attack.
pub fn calculate_enemy_strike(
    enemy: &CombatStats,
    tap_angle: f64,
    zone_hit: ZoneHitResult,
    zones: &ZoneTable,
) -> EnemyStrike {
    let (incoming, self_injury) = split_signed(zone_damage(enemy.attack_power, &zone_hit, zones));

    EnemyStrike {
        tap_angle,
        zone_hit,
        incoming,
        self_injury,
    }
}

/// Defense phase: the player's block against an incoming strike.
///
/// ```text
/// block   = defense_power * zone_multiplier(zone) [* crit]
/// blocked = clamp(block, 0, incoming)
/// taken   = incoming - blocked
/// ```
///
/// A negative block (injure zone) blocks nothing and adds `|block|` of
/// self-injury on top of the damage taken.
pub fn calculate_defense(
    incoming: f64,
    defender: &CombatStats,
    zone_hit: ZoneHitResult,
    zones: &ZoneTable,
) -> DamageResult {
    let incoming = incoming.max(0.0);
    let (block, self_injury) = split_signed(zone_damage(defender.defense_power, &zone_hit, zones));
    let blocked = block.min(incoming);

    DamageResult {
        zone_hit,
        final_damage: incoming - blocked,
        blocked,
        self_injury,
        was_critical: zone_hit.is_critical,
    }
}

/// Apply damage to current HP.
///
/// Returns the new HP clamped to `[0, max_hp]`.
pub fn apply_damage(current_hp: f64, damage: f64, max_hp: f64) -> f64 {
    (current_hp - damage.max(0.0)).clamp(0.0, max_hp)
}
