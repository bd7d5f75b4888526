//! Per-phase resolution of a validated tap.
//!
//! Functions here only read the session; the engine applies the returned
//! [`Resolution`] afterwards.

use crate::combat::{
    DamageResult, EnemyStrike, InvalidAngle, calculate_attack_damage, calculate_defense,
    calculate_enemy_strike, resolve_zone,
};
use crate::env::{CombatEnv, compute_seed, roll};
use crate::event::CombatEventType;
use crate::session::CombatSession;
use crate::stats::Combatant;

/// Everything one action does to the two combatants.
#[derive(Clone, Copy, Debug)]
pub(super) struct Resolution {
    pub damage: DamageResult,
    pub enemy_strike: Option<EnemyStrike>,
    pub player_loss: f64,
    pub enemy_loss: f64,
}

impl Resolution {
    /// Events describing the hits, in the order they happened.
    pub fn events(&self) -> Vec<CombatEventType> {
        let mut events = Vec::with_capacity(3);

        match self.enemy_strike {
            None => {
                if self.damage.zone_hit.zone.is_injure() {
                    events.push(CombatEventType::PlayerInjured {
                        damage: self.damage.self_injury,
                    });
                } else {
                    events.push(CombatEventType::EnemyStruck {
                        zone: self.damage.zone_hit.zone,
                        damage: self.damage.final_damage,
                        critical: self.damage.was_critical,
                    });
                }
            }
            Some(strike) => {
                if strike.zone_hit.zone.is_injure() {
                    events.push(CombatEventType::EnemyInjured {
                        damage: strike.self_injury,
                    });
                } else {
                    events.push(CombatEventType::PlayerStruck {
                        zone: strike.zone_hit.zone,
                        incoming: strike.incoming,
                        blocked: self.damage.blocked,
                        taken: self.damage.final_damage,
                        critical: strike.zone_hit.is_critical,
                    });
                }
                if self.damage.self_injury > 0.0 {
                    events.push(CombatEventType::PlayerInjured {
                        damage: self.damage.self_injury,
                    });
                }
            }
        }

        events
    }
}

fn seed_for(session: &CombatSession, actor: Combatant, context: u32) -> u64 {
    compute_seed(session.seed, session.version, actor.actor_id(), context)
}

/// Attack phase: the player's tap on their attack bands hits the enemy.
pub(super) fn resolve_attack(
    session: &CombatSession,
    env: &CombatEnv<'_>,
    tap_angle: f64,
) -> Result<Resolution, InvalidAngle> {
    let zone_hit = resolve_zone(
        tap_angle,
        &session.bands.player_attack,
        &env.config.crit,
        env.rng,
        seed_for(session, Combatant::Player, roll::PLAYER_CRIT),
    )?;

    let damage = calculate_attack_damage(&session.player_stats, zone_hit, &env.config.zones);

    Ok(Resolution {
        damage,
        enemy_strike: None,
        player_loss: damage.self_injury,
        enemy_loss: damage.final_damage,
    })
}

/// Defense phase: the enemy strikes on its own bands, the player's tap on
/// their defense bands decides how much of it is blocked.
pub(super) fn resolve_defense(
    session: &CombatSession,
    env: &CombatEnv<'_>,
    tap_angle: f64,
) -> Result<Resolution, InvalidAngle> {
    let config = env.config;

    let enemy_angle = env
        .rng
        .roll_angle(seed_for(session, Combatant::Enemy, roll::ENEMY_ANGLE));
    let enemy_hit = resolve_zone(
        enemy_angle,
        &session.bands.enemy_attack,
        &config.crit,
        env.rng,
        seed_for(session, Combatant::Enemy, roll::ENEMY_CRIT),
    )?;
    let strike = calculate_enemy_strike(&session.enemy_stats, enemy_angle, enemy_hit, &config.zones);

    let block_hit = resolve_zone(
        tap_angle,
        &session.bands.player_defense,
        &config.crit,
        env.rng,
        seed_for(session, Combatant::Player, roll::PLAYER_CRIT),
    )?;
    let damage = calculate_defense(strike.incoming, &session.player_stats, block_hit, &config.zones);

    Ok(Resolution {
        damage,
        enemy_strike: Some(strike),
        player_loss: damage.player_loss(true),
        enemy_loss: strike.self_injury,
    })
}
