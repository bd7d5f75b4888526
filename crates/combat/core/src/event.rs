//! Events describing what happened to a session.
//!
//! The engine returns these alongside each outcome so adapters can forward
//! them (event bus, client feed, analytics) without diffing sessions.

use crate::combat::Zone;
use crate::session::{EnemyId, PlayerId, SessionId};

/// A single fact about one session.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatEvent {
    pub session_id: SessionId,
    /// Turn the event happened in.
    pub turn_number: u32,
    pub kind: CombatEventType,
}

impl CombatEvent {
    pub fn new(session_id: SessionId, turn_number: u32, kind: CombatEventType) -> Self {
        Self {
            session_id,
            turn_number,
            kind,
        }
    }

    /// True for events that end the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            CombatEventType::Victory
                | CombatEventType::Defeat
                | CombatEventType::Retreated
                | CombatEventType::Expired
        )
    }
}

#[derive(Clone, Debug, PartialEq, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum CombatEventType {
    SessionStarted {
        player_id: PlayerId,
        enemy_id: EnemyId,
    },
    /// The player's attack landed on the enemy.
    EnemyStruck {
        zone: Zone,
        damage: f64,
        critical: bool,
    },
    /// The enemy's counter-strike reached the player.
    PlayerStruck {
        zone: Zone,
        incoming: f64,
        blocked: f64,
        taken: f64,
        critical: bool,
    },
    /// The player hit their own injure zone.
    PlayerInjured { damage: f64 },
    /// The enemy hit its own injure zone.
    EnemyInjured { damage: f64 },
    Victory,
    Defeat,
    Retreated,
    /// An idle session passed its deadline and was abandoned.
    Expired,
    RewardsClaimed { gold: u32, experience: u32 },
}
