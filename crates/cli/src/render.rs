//! Human-readable output for combat events and results.
use combat_core::{CombatEvent, CombatEventType, CombatSession, RewardBreakdown};

pub fn describe(event: &CombatEvent) -> String {
    let turn = event.turn_number;
    match &event.kind {
        CombatEventType::SessionStarted {
            player_id,
            enemy_id,
        } => format!("{} engages {}", player_id, enemy_id),
        CombatEventType::EnemyStruck {
            zone,
            damage,
            critical,
        } => format!(
            "[turn {}] attack lands {}{} for {:.1}",
            turn,
            zone,
            crit_tag(*critical),
            damage
        ),
        CombatEventType::PlayerStruck {
            zone,
            incoming,
            blocked,
            taken,
            critical,
        } => format!(
            "[turn {}] enemy strikes {}{} for {:.1}, blocked {:.1}, took {:.1}",
            turn,
            zone,
            crit_tag(*critical),
            incoming,
            blocked,
            taken
        ),
        CombatEventType::PlayerInjured { damage } => {
            format!("[turn {}] you injure yourself for {:.1}", turn, damage)
        }
        CombatEventType::EnemyInjured { damage } => {
            format!("[turn {}] the enemy injures itself for {:.1}", turn, damage)
        }
        CombatEventType::Victory => format!("[turn {}] victory", turn),
        CombatEventType::Defeat => format!("[turn {}] defeat", turn),
        CombatEventType::Retreated => format!("[turn {}] retreated", turn),
        CombatEventType::Expired => format!("[turn {}] session expired", turn),
        CombatEventType::RewardsClaimed { gold, experience } => {
            format!("rewards claimed: {} gold, {} xp", gold, experience)
        }
    }
}

fn crit_tag(critical: bool) -> &'static str {
    if critical { " (critical)" } else { "" }
}

pub fn summary(session: &CombatSession, rewards: &RewardBreakdown) -> String {
    let mut out = format!(
        "{} after {} turns | hp {:.1}/{:.1} vs {:.1}/{:.1}\n{} gold, {} xp",
        session.status(),
        session.turn_number(),
        session.player_hp(),
        session.player_stats().max_hp,
        session.enemy_hp(),
        session.enemy_stats().max_hp,
        rewards.gold,
        rewards.experience
    );
    for drop in &rewards.materials {
        out.push_str(&format!("\n  {} x{}", drop.material, drop.quantity));
    }
    out
}
