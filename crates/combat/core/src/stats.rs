//! Combatant stat snapshots.

use crate::session::SessionError;

/// Which side of the encounter a value belongs to.
#[derive(
    Clone,
    Copy,
    Debug,
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
pub enum Combatant {
    Player,
    Enemy,
}

impl Combatant {
    /// Actor id mixed into RNG seeds.
    pub const fn actor_id(self) -> u32 {
        match self {
            Combatant::Player => 0,
            Combatant::Enemy => 1,
        }
    }
}

/// Immutable stat snapshot taken when a session starts.
///
/// Later changes to the player or enemy record (equipment swaps, level-ups)
/// never reach a running session.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatStats {
    pub attack_power: f64,
    /// Nominally 0-100; values outside are clamped by the band model.
    pub attack_accuracy: f64,
    pub defense_power: f64,
    /// Nominally 0-100; values outside are clamped by the band model.
    pub defense_accuracy: f64,
    pub max_hp: f64,
}

impl CombatStats {
    pub const fn new(
        attack_power: f64,
        attack_accuracy: f64,
        defense_power: f64,
        defense_accuracy: f64,
        max_hp: f64,
    ) -> Self {
        Self {
            attack_power,
            attack_accuracy,
            defense_power,
            defense_accuracy,
            max_hp,
        }
    }

    /// Reject snapshots the engine cannot reason about.
    ///
    /// Every field must be finite, powers must be non-negative and max HP
    /// positive. Accuracy may exceed 0-100; only non-finite values fail.
    pub fn validate(&self, role: Combatant) -> Result<(), SessionError> {
        let fields = [
            ("attack_power", self.attack_power, 0.0),
            ("attack_accuracy", self.attack_accuracy, f64::NEG_INFINITY),
            ("defense_power", self.defense_power, 0.0),
            ("defense_accuracy", self.defense_accuracy, f64::NEG_INFINITY),
        ];

        for (field, value, min) in fields {
            if !value.is_finite() || value < min {
                return Err(SessionError::InvalidStats { role, field, value });
            }
        }

        if !self.max_hp.is_finite() || self.max_hp <= 0.0 {
            return Err(SessionError::InvalidStats {
                role,
                field: "max_hp",
                value: self.max_hp,
            });
        }

        Ok(())
    }
}
