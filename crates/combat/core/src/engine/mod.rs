//! Action execution pipeline.
//!
//! The [`CombatEngine`] is the authoritative reducer for [`CombatSession`].
//! Every action goes through validate → resolve → apply; nothing on the
//! session changes until the first two steps have succeeded, so a rejected
//! action leaves the session byte-identical.

mod errors;
mod transition;

pub use errors::ExecuteError;

use crate::combat::{DamageResult, EnemyStrike, ZoneHitResult, apply_damage, normalize_angle};
use crate::env::CombatEnv;
use crate::event::{CombatEvent, CombatEventType};
use crate::session::{CombatPhase, CombatSession, SessionStatus, Timestamp};

/// A single tap submitted by the player.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatAction {
    /// Phase the client believes the session is in.
    pub phase: CombatPhase,
    pub tap_angle_degrees: f64,
}

impl CombatAction {
    pub const fn new(phase: CombatPhase, tap_angle_degrees: f64) -> Self {
        Self {
            phase,
            tap_angle_degrees,
        }
    }

    pub const fn attack(tap_angle_degrees: f64) -> Self {
        Self::new(CombatPhase::PlayerAttack, tap_angle_degrees)
    }

    pub const fn defend(tap_angle_degrees: f64) -> Self {
        Self::new(CombatPhase::PlayerDefense, tap_angle_degrees)
    }
}

/// Result of one accepted action.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionOutcome {
    /// Phase the action resolved in.
    pub phase: CombatPhase,
    /// The player's tap: damage dealt when attacking, block split when
    /// defending.
    pub damage: DamageResult,
    /// The enemy's counter-strike. `None` for attack actions.
    pub enemy_strike: Option<EnemyStrike>,
    pub player_hp: f64,
    pub enemy_hp: f64,
    pub status: SessionStatus,
    /// Turn number after the action.
    pub turn_number: u32,
    pub events: Vec<CombatEvent>,
}

impl ActionOutcome {
    /// Zone the player's tap landed in.
    pub fn zone_hit(&self) -> ZoneHitResult {
        self.damage.zone_hit
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Reducer over a borrowed session.
pub struct CombatEngine<'a> {
    session: &'a mut CombatSession,
}

impl<'a> CombatEngine<'a> {
    pub fn new(session: &'a mut CombatSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &CombatSession {
        self.session
    }

    /// Resolves one tap against the session.
    ///
    /// Rejects, in order: sessions that are not active (including lazily
    /// expired ones), taps for the wrong phase, and non-finite angles.
    pub fn execute(
        &mut self,
        env: &CombatEnv<'_>,
        action: &CombatAction,
    ) -> Result<ActionOutcome, ExecuteError> {
        self.validate(env.now, action)?;
        let tap_angle = normalize_angle(action.tap_angle_degrees)?;

        let resolution = match action.phase {
            CombatPhase::PlayerAttack => transition::resolve_attack(self.session, env, tap_angle)?,
            CombatPhase::PlayerDefense => {
                transition::resolve_defense(self.session, env, tap_angle)?
            }
        };

        let session = &mut *self.session;
        let turn = session.turn_number;
        let mut events: Vec<CombatEvent> = resolution
            .events()
            .into_iter()
            .map(|kind| CombatEvent::new(session.id, turn, kind))
            .collect();

        session.player_hp = apply_damage(
            session.player_hp,
            resolution.player_loss,
            session.player_stats.max_hp,
        );
        session.enemy_hp = apply_damage(
            session.enemy_hp,
            resolution.enemy_loss,
            session.enemy_stats.max_hp,
        );

        // A double knock-out counts as a defeat.
        session.status = if session.player_hp <= 0.0 {
            SessionStatus::Defeat
        } else if session.enemy_hp <= 0.0 {
            SessionStatus::Victory
        } else {
            SessionStatus::Active
        };

        match session.status {
            SessionStatus::Active => {
                if action.phase == CombatPhase::PlayerDefense {
                    session.turn_number = session.turn_number.saturating_add(1);
                }
                session.current_phase = action.phase.next();
                if let Some(ttl) = session.ttl_millis {
                    session.expires_at = Some(env.now.saturating_add_millis(ttl));
                }
            }
            SessionStatus::Victory => {
                events.push(CombatEvent::new(session.id, turn, CombatEventType::Victory));
            }
            SessionStatus::Defeat => {
                events.push(CombatEvent::new(session.id, turn, CombatEventType::Defeat));
            }
            SessionStatus::Abandoned => {}
        }

        session.version += 1;
        session.last_action_at = env.now;

        Ok(ActionOutcome {
            phase: action.phase,
            damage: resolution.damage,
            enemy_strike: resolution.enemy_strike,
            player_hp: session.player_hp,
            enemy_hp: session.enemy_hp,
            status: session.status,
            turn_number: session.turn_number,
            events,
        })
    }

    /// Abandons an active session.
    ///
    /// Terminal sessions are left untouched and `None` is returned, so
    /// retreating twice is harmless.
    pub fn retreat(&mut self, now: Timestamp) -> Option<CombatEvent> {
        if self.session.status.is_terminal() {
            return None;
        }
        self.abandon(now, CombatEventType::Retreated)
    }

    /// Persists lazy expiry: an active session past its deadline becomes
    /// Abandoned. Returns `None` when there is nothing to expire.
    pub fn expire(&mut self, now: Timestamp) -> Option<CombatEvent> {
        if self.session.status != SessionStatus::Active || !self.session.is_expired(now) {
            return None;
        }
        self.abandon(now, CombatEventType::Expired)
    }

    fn abandon(&mut self, now: Timestamp, kind: CombatEventType) -> Option<CombatEvent> {
        let session = &mut *self.session;
        session.status = SessionStatus::Abandoned;
        session.version += 1;
        session.last_action_at = now;
        Some(CombatEvent::new(session.id, session.turn_number, kind))
    }

    fn validate(&self, now: Timestamp, action: &CombatAction) -> Result<(), ExecuteError> {
        let status = self.session.effective_status(now);
        if status != SessionStatus::Active {
            return Err(ExecuteError::SessionNotActive {
                session_id: self.session.id,
                status,
            });
        }

        if action.phase != self.session.current_phase {
            return Err(ExecuteError::PhaseMismatch {
                expected: self.session.current_phase,
                submitted: action.phase,
            });
        }

        Ok(())
    }
}

/// Pure form of [`CombatEngine::execute`]: returns the next session instead
/// of mutating the given one.
pub fn transition(
    session: &CombatSession,
    env: &CombatEnv<'_>,
    action: &CombatAction,
) -> Result<(CombatSession, ActionOutcome), ExecuteError> {
    let mut next = session.clone();
    let outcome = CombatEngine::new(&mut next).execute(env, action)?;
    Ok((next, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::env::FixedRng;
    use crate::session::{EnemyId, PlayerId};
    use crate::stats::CombatStats;

    fn session(config: &CombatConfig, ttl: Option<u64>) -> CombatSession {
        CombatSession::builder(
            PlayerId(1),
            EnemyId(2),
            CombatStats::new(20.0, 50.0, 10.0, 50.0, 100.0),
            CombatStats::new(10.0, 50.0, 5.0, 50.0, 50.0),
        )
        .seed(7)
        .created_at(Timestamp(1_000))
        .ttl_millis(ttl)
        .build(&config.bands)
        .unwrap()
    }

    #[test]
    fn attack_advances_to_defense_without_bumping_turn() {
        let config = CombatConfig::default();
        let rng = FixedRng::at_angle(0.0, false);
        let env = CombatEnv::new(&config, &rng, Timestamp(2_000));
        let mut s = session(&config, None);

        let outcome = CombatEngine::new(&mut s)
            .execute(&env, &CombatAction::attack(180.0))
            .unwrap();

        assert_eq!(outcome.zone_hit().zone, crate::combat::Zone::Good);
        assert_eq!(s.enemy_hp(), 30.0);
        assert_eq!(s.current_phase(), CombatPhase::PlayerDefense);
        assert_eq!(s.turn_number(), 1);
        assert_eq!(s.version(), 1);
        assert_eq!(s.last_action_at(), Timestamp(2_000));
    }

    #[test]
    fn wrong_phase_leaves_session_untouched() {
        let config = CombatConfig::default();
        let rng = FixedRng::at_angle(0.0, false);
        let env = CombatEnv::new(&config, &rng, Timestamp(2_000));
        let mut s = session(&config, None);
        let before = s.clone();

        let err = CombatEngine::new(&mut s)
            .execute(&env, &CombatAction::defend(10.0))
            .unwrap_err();

        assert_eq!(
            err,
            ExecuteError::PhaseMismatch {
                expected: CombatPhase::PlayerAttack,
                submitted: CombatPhase::PlayerDefense,
            }
        );
        assert_eq!(s, before);
    }

    #[test]
    fn non_finite_angle_is_rejected() {
        let config = CombatConfig::default();
        let rng = FixedRng::at_angle(0.0, false);
        let env = CombatEnv::new(&config, &rng, Timestamp(2_000));
        let mut s = session(&config, None);
        let before = s.clone();

        let err = CombatEngine::new(&mut s)
            .execute(&env, &CombatAction::attack(f64::NAN))
            .unwrap_err();

        assert!(matches!(err, ExecuteError::InvalidInput(_)));
        assert_eq!(s, before);
    }

    #[test]
    fn expired_session_rejects_and_expire_materializes() {
        let config = CombatConfig::default();
        let rng = FixedRng::at_angle(0.0, false);
        let mut s = session(&config, Some(500));
        let env = CombatEnv::new(&config, &rng, Timestamp(1_500));

        let err = CombatEngine::new(&mut s)
            .execute(&env, &CombatAction::attack(180.0))
            .unwrap_err();
        assert!(matches!(
            err,
            ExecuteError::SessionNotActive {
                status: SessionStatus::Abandoned,
                ..
            }
        ));
        assert_eq!(s.status(), SessionStatus::Active);

        let event = CombatEngine::new(&mut s).expire(Timestamp(1_500)).unwrap();
        assert_eq!(event.kind, CombatEventType::Expired);
        assert_eq!(s.status(), SessionStatus::Abandoned);
        assert_eq!(s.version(), 1);
        assert!(CombatEngine::new(&mut s).expire(Timestamp(1_600)).is_none());
    }

    #[test]
    fn accepted_action_slides_deadline() {
        let config = CombatConfig::default();
        let rng = FixedRng::at_angle(0.0, false);
        let mut s = session(&config, Some(500));
        let env = CombatEnv::new(&config, &rng, Timestamp(1_400));

        CombatEngine::new(&mut s)
            .execute(&env, &CombatAction::attack(180.0))
            .unwrap();

        assert_eq!(s.expires_at(), Some(Timestamp(1_900)));
        assert!(s.is_active(Timestamp(1_800)));
    }

    #[test]
    fn turn_counter_saturates() {
        let config = CombatConfig::default();
        let rng = FixedRng::at_angle(180.0, false);
        let env = CombatEnv::new(&config, &rng, Timestamp(2_000));
        let mut s = session(&config, None);
        s.current_phase = CombatPhase::PlayerDefense;
        s.turn_number = u32::MAX;

        let outcome = CombatEngine::new(&mut s)
            .execute(&env, &CombatAction::defend(180.0))
            .unwrap();

        assert_eq!(outcome.status, SessionStatus::Active);
        assert_eq!(s.turn_number(), u32::MAX);
        assert_eq!(s.current_phase(), CombatPhase::PlayerAttack);
    }

    #[test]
    fn retreat_is_idempotent() {
        let config = CombatConfig::default();
        let mut s = session(&config, None);

        let first = CombatEngine::new(&mut s).retreat(Timestamp(5));
        assert_eq!(first.map(|e| e.kind), Some(CombatEventType::Retreated));
        let after_first = s.clone();

        assert!(CombatEngine::new(&mut s).retreat(Timestamp(6)).is_none());
        assert_eq!(s, after_first);
        assert_eq!(s.status(), SessionStatus::Abandoned);
    }

    #[test]
    fn transition_does_not_touch_input() {
        let config = CombatConfig::default();
        let rng = FixedRng::at_angle(0.0, false);
        let env = CombatEnv::new(&config, &rng, Timestamp(2_000));
        let s = session(&config, None);

        let (next, outcome) = transition(&s, &env, &CombatAction::attack(10.0)).unwrap();

        assert_eq!(s.version(), 0);
        assert_eq!(next.version(), 1);
        assert_eq!(next.enemy_hp(), outcome.enemy_hp);
    }
}
