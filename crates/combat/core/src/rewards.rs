//! Post-combat reward calculation.
//!
//! Rewards depend only on the enemy level, the terminal status and the
//! reward table. Rolls are seeded from the session, so asking twice for the
//! same finished session yields the same breakdown.

use arrayvec::ArrayVec;

use crate::config::RewardTable;
use crate::env::{RngOracle, compute_seed, roll};
use crate::error::{CombatError, ErrorSeverity};
use crate::session::{CombatSession, SessionStatus};
use crate::stats::Combatant;

/// Upper bound on distinct materials a single victory can drop.
pub const MAX_MATERIAL_DROPS: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialDrop {
    pub material: String,
    pub quantity: u32,
}

/// Gold, experience and materials granted for a finished session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RewardBreakdown {
    pub outcome: SessionStatus,
    pub gold: u32,
    pub experience: u32,
    pub materials: ArrayVec<MaterialDrop, MAX_MATERIAL_DROPS>,
}

impl RewardBreakdown {
    /// Breakdown that grants nothing.
    pub fn empty(outcome: SessionStatus) -> Self {
        Self {
            outcome,
            gold: 0,
            experience: 0,
            materials: ArrayVec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gold == 0 && self.experience == 0 && self.materials.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RewardError {
    #[error("rewards are only available once combat has ended (status: {status})")]
    NotTerminal { status: SessionStatus },
}

impl CombatError for RewardError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotTerminal { .. } => "NOT_TERMINAL",
        }
    }
}

/// Computes the rewards for an enemy of `enemy_level` and a terminal
/// `outcome`.
///
/// - Victory: gold in `[gold_min_per_level * L, gold_max_per_level * L]`,
///   `xp_base + xp_per_level * L` experience, and each material whose
///   `min_level` is reached drops with its own chance.
/// - Defeat: `consolation_percent` of the victory gold and experience, no
///   materials.
/// - Abandoned: nothing.
///
/// `L` is the enemy level, with level 0 treated as 1.
pub fn compute_rewards(
    enemy_level: u32,
    outcome: SessionStatus,
    table: &RewardTable,
    rng: &(impl RngOracle + ?Sized),
    session_seed: u64,
    nonce: u64,
) -> Result<RewardBreakdown, RewardError> {
    let level = enemy_level.max(1);
    let seed_for = |context: u32| {
        compute_seed(session_seed, nonce, Combatant::Player.actor_id(), context)
    };

    match outcome {
        SessionStatus::Active => Err(RewardError::NotTerminal { status: outcome }),
        SessionStatus::Abandoned => Ok(RewardBreakdown::empty(outcome)),
        SessionStatus::Victory | SessionStatus::Defeat => {
            let gold = rng.range(
                seed_for(roll::REWARD_GOLD),
                table.gold_min_per_level.saturating_mul(level),
                table.gold_max_per_level.saturating_mul(level),
            );
            let experience = table
                .xp_base
                .saturating_add(table.xp_per_level.saturating_mul(level));

            if outcome == SessionStatus::Defeat {
                return Ok(RewardBreakdown {
                    outcome,
                    gold: percent_of(gold, table.consolation_percent),
                    experience: percent_of(experience, table.consolation_percent),
                    materials: ArrayVec::new(),
                });
            }

            let quantity = 1 + level / table.quantity_level_step.max(1);
            let mut materials = ArrayVec::new();
            for (index, spec) in table.materials.iter().enumerate() {
                if spec.min_level > level {
                    continue;
                }
                let drop_roll = rng.roll_d100(seed_for(roll::REWARD_MATERIAL + index as u32));
                if drop_roll > spec.chance_percent {
                    continue;
                }
                let drop = MaterialDrop {
                    material: spec.material.clone(),
                    quantity,
                };
                if materials.try_push(drop).is_err() {
                    break;
                }
            }

            Ok(RewardBreakdown {
                outcome,
                gold,
                experience,
                materials,
            })
        }
    }
}

/// Rewards for a finished session, seeded from the session itself.
pub fn session_rewards(
    session: &CombatSession,
    table: &RewardTable,
    rng: &(impl RngOracle + ?Sized),
) -> Result<RewardBreakdown, RewardError> {
    compute_rewards(
        session.enemy_level(),
        session.status(),
        table,
        rng,
        session.seed(),
        session.version(),
    )
}

fn percent_of(value: u32, percent: u32) -> u32 {
    (u64::from(value) * u64::from(percent) / 100) as u32
}
