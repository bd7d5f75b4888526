//! End-to-end encounters driven through the engine.

use std::collections::VecDeque;
use std::sync::Mutex;

use combat_core::{
    CombatAction, CombatConfig, CombatEngine, CombatEnv, CombatEventType, CombatPhase,
    CombatSession, CombatStats, EnemyId, ExecuteError, FixedRng, PcgRng, PlayerId, RngOracle,
    SessionStatus, Timestamp, WeaponBands, Zone, resolve_zone,
};

/// Oracle that hands out a scripted sequence, then a value that rolls
/// zone 1 without a crit.
struct ScriptedRng(Mutex<VecDeque<u32>>);

impl ScriptedRng {
    fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self(Mutex::new(values.into_iter().collect()))
    }

    /// Enemy counter-strike lands on `angle`.
    fn enemy_at(angle: f64) -> Self {
        Self::new([FixedRng::at_angle(angle, false).0])
    }
}

impl RngOracle for ScriptedRng {
    fn next_u32(&self, _seed: u64) -> u32 {
        self.0.lock().unwrap().pop_front().unwrap_or(50)
    }
}

const NOW: Timestamp = Timestamp(10_000);

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn player() -> CombatStats {
    CombatStats::new(20.0, 50.0, 4.0, 50.0, 100.0)
}

fn enemy(max_hp: f64) -> CombatStats {
    CombatStats::new(10.0, 50.0, 5.0, 50.0, max_hp)
}

fn session(config: &CombatConfig, player: CombatStats, enemy: CombatStats) -> CombatSession {
    CombatSession::builder(PlayerId(1), EnemyId(9), player, enemy)
        .seed(42)
        .created_at(NOW)
        .build(&config.bands)
        .unwrap()
}

fn attack(
    session: &mut CombatSession,
    config: &CombatConfig,
    rng: &dyn RngOracle,
    angle: f64,
) -> Result<combat_core::ActionOutcome, ExecuteError> {
    let env = CombatEnv::new(config, rng, NOW);
    CombatEngine::new(session).execute(&env, &CombatAction::attack(angle))
}

fn defend(
    session: &mut CombatSession,
    config: &CombatConfig,
    rng: &dyn RngOracle,
    angle: f64,
) -> Result<combat_core::ActionOutcome, ExecuteError> {
    let env = CombatEnv::new(config, rng, NOW);
    CombatEngine::new(session).execute(&env, &CombatAction::defend(angle))
}

#[test]
fn new_session_uses_baseline_band_table() {
    let config = CombatConfig::default();
    let s = session(&config, player(), enemy(50.0));

    assert_eq!(
        s.bands().player_attack.widths(),
        [36.0, 54.0, 126.0, 90.0, 54.0]
    );
    assert_eq!(s.status(), SessionStatus::Active);
    assert_eq!(s.current_phase(), CombatPhase::PlayerAttack);
    assert_eq!(s.turn_number(), 1);
    assert_eq!(s.player_hp(), 100.0);
    assert_eq!(s.enemy_hp(), 50.0);
}

#[test]
fn tap_at_zero_hits_zone_one() {
    let config = CombatConfig::default();
    let bands = WeaponBands::from_widths([40.0, 60.0, 120.0, 80.0, 60.0]).unwrap();
    let hit = resolve_zone(0.0, &bands, &config.crit, &FixedRng::at_angle(0.0, false), 0).unwrap();

    assert_eq!(hit.zone, Zone::Perfect);
    assert_eq!(hit.zone_index(), 1);
    assert!(!hit.is_critical);
}

#[test]
fn zone_one_attack_without_crit_deals_thirty() {
    let config = CombatConfig::default();
    let mut s = session(&config, player(), enemy(100.0));
    let rng = FixedRng::at_angle(0.0, false);

    let outcome = attack(&mut s, &config, &rng, 0.0).unwrap();

    assert_eq!(outcome.zone_hit().zone, Zone::Perfect);
    assert_eq!(outcome.damage.final_damage, 30.0);
    assert_eq!(s.enemy_hp(), 70.0);
    assert_eq!(s.player_hp(), 100.0);
    assert_eq!(
        outcome.events[0].kind,
        CombatEventType::EnemyStruck {
            zone: Zone::Perfect,
            damage: 30.0,
            critical: false,
        }
    );
}

#[test]
fn zone_one_crit_multiplies_after_zone() {
    let config = CombatConfig::default();
    let mut s = session(&config, player(), enemy(100.0));
    let rng = FixedRng::at_angle(0.0, true);

    let outcome = attack(&mut s, &config, &rng, 10.0).unwrap();

    assert!(outcome.damage.was_critical);
    assert!(approx(outcome.damage.final_damage, 45.0));
    assert!(approx(s.enemy_hp(), 55.0));
}

#[test]
fn injure_zone_attack_hurts_attacker() {
    let config = CombatConfig::default();
    let mut s = session(&config, player(), enemy(50.0));
    let rng = FixedRng::at_angle(0.0, false);

    let outcome = attack(&mut s, &config, &rng, 330.0).unwrap();

    assert_eq!(outcome.zone_hit().zone, Zone::Injure);
    assert!(approx(outcome.damage.self_injury, 6.0));
    assert!(approx(s.player_hp(), 94.0));
    assert_eq!(s.enemy_hp(), 50.0);
    assert!(matches!(
        outcome.events[0].kind,
        CombatEventType::PlayerInjured { .. }
    ));
}

#[test]
fn defend_during_attack_phase_is_rejected() {
    let config = CombatConfig::default();
    let mut s = session(&config, player(), enemy(50.0));
    let before = s.clone();

    let err = defend(&mut s, &config, &PcgRng, 100.0).unwrap_err();

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
fn exact_lethal_attack_wins_and_locks_session() {
    let config = CombatConfig::default();
    let mut s = session(&config, player(), enemy(30.0));
    let rng = FixedRng::at_angle(0.0, false);

    let outcome = attack(&mut s, &config, &rng, 5.0).unwrap();
    assert_eq!(s.enemy_hp(), 0.0);
    assert_eq!(outcome.status, SessionStatus::Victory);
    assert_eq!(
        outcome.events.last().map(|e| &e.kind),
        Some(&CombatEventType::Victory)
    );

    let frozen = s.clone();
    for action in [CombatAction::attack(5.0), CombatAction::defend(5.0)] {
        let env = CombatEnv::new(&config, &rng, NOW);
        let err = CombatEngine::new(&mut s).execute(&env, &action).unwrap_err();
        assert!(matches!(
            err,
            ExecuteError::SessionNotActive {
                status: SessionStatus::Victory,
                ..
            }
        ));
    }
    assert_eq!(s, frozen);
}

#[test]
fn defense_splits_incoming_into_blocked_and_taken() {
    let config = CombatConfig::default();
    let mut s = session(&config, player(), enemy(100.0));
    attack(&mut s, &config, &FixedRng::at_angle(180.0, false), 180.0).unwrap();

    // Enemy lands in Good (10 incoming), player blocks in Good (4).
    let rng = ScriptedRng::enemy_at(180.0);
    let outcome = defend(&mut s, &config, &rng, 180.0).unwrap();

    let strike = outcome.enemy_strike.unwrap();
    assert_eq!(strike.zone_hit.zone, Zone::Good);
    assert_eq!(strike.incoming, 10.0);
    assert_eq!(outcome.damage.blocked, 4.0);
    assert_eq!(outcome.damage.final_damage, 6.0);
    assert_eq!(s.player_hp(), 94.0);
    assert_eq!(s.turn_number(), 2);
    assert_eq!(s.current_phase(), CombatPhase::PlayerAttack);
    assert_eq!(
        outcome.events[0].kind,
        CombatEventType::PlayerStruck {
            zone: Zone::Good,
            incoming: 10.0,
            blocked: 4.0,
            taken: 6.0,
            critical: false,
        }
    );
}

#[test]
fn block_never_exceeds_incoming() {
    let config = CombatConfig::default();
    let strong_guard = CombatStats::new(20.0, 50.0, 100.0, 50.0, 100.0);
    let mut s = session(&config, strong_guard, enemy(100.0));
    attack(&mut s, &config, &FixedRng::at_angle(180.0, false), 180.0).unwrap();

    let rng = ScriptedRng::enemy_at(180.0);
    let outcome = defend(&mut s, &config, &rng, 0.0).unwrap();

    assert_eq!(outcome.damage.blocked, 10.0);
    assert_eq!(outcome.damage.final_damage, 0.0);
    assert_eq!(s.player_hp(), 100.0);
}

#[test]
fn enemy_injure_strike_hurts_enemy() {
    let config = CombatConfig::default();
    let mut s = session(&config, player(), enemy(100.0));
    attack(&mut s, &config, &FixedRng::at_angle(180.0, false), 180.0).unwrap();
    let enemy_before = s.enemy_hp();

    let rng = ScriptedRng::enemy_at(330.0);
    let outcome = defend(&mut s, &config, &rng, 180.0).unwrap();

    let strike = outcome.enemy_strike.unwrap();
    assert_eq!(strike.zone_hit.zone, Zone::Injure);
    assert_eq!(strike.incoming, 0.0);
    assert!(approx(s.enemy_hp(), enemy_before - 3.0));
    assert_eq!(s.player_hp(), 100.0);
    assert!(matches!(
        outcome.events[0].kind,
        CombatEventType::EnemyInjured { .. }
    ));
}

#[test]
fn double_knockout_counts_as_defeat() {
    let config = CombatConfig::default();
    let fragile = CombatStats::new(0.0, 50.0, 4.0, 50.0, 1.0);
    let glass_enemy = CombatStats::new(10.0, 50.0, 5.0, 50.0, 3.0);
    let mut s = session(&config, fragile, glass_enemy);
    attack(&mut s, &config, &FixedRng::at_angle(180.0, false), 180.0).unwrap();

    // Enemy injures itself for 3, player fumbles the block for 1.2.
    let rng = ScriptedRng::enemy_at(330.0);
    let outcome = defend(&mut s, &config, &rng, 330.0).unwrap();

    assert_eq!(s.enemy_hp(), 0.0);
    assert_eq!(s.player_hp(), 0.0);
    assert_eq!(outcome.status, SessionStatus::Defeat);
}

#[test]
fn phases_alternate_until_terminal() {
    let config = CombatConfig::default();
    let mut s = session(&config, player(), enemy(400.0));
    let angles = [12.0, 200.0, 45.0, 300.0, 100.0, 350.0, 0.0, 180.0];

    for step in 0..200 {
        if s.status().is_terminal() {
            break;
        }
        let phase = s.current_phase();
        let turn = s.turn_number();
        let angle = angles[step % angles.len()];
        let env = CombatEnv::new(&config, &PcgRng, NOW);
        let outcome = CombatEngine::new(&mut s)
            .execute(&env, &CombatAction::new(phase, angle))
            .unwrap();

        if outcome.status == SessionStatus::Active {
            assert_eq!(s.current_phase(), phase.next());
            let expected_turn = if phase == CombatPhase::PlayerDefense {
                turn + 1
            } else {
                turn
            };
            assert_eq!(s.turn_number(), expected_turn);
        } else {
            assert_eq!(s.current_phase(), phase);
            assert_eq!(s.turn_number(), turn);
        }
        assert!(s.is_consistent());
        assert_eq!(s.version(), step as u64 + 1);
    }
}

#[test]
fn hp_stays_within_bounds_for_huge_damage() {
    let config = CombatConfig::default();
    let brute = CombatStats::new(1e12, 50.0, 1e12, 50.0, 100.0);
    let mut s = session(&config, brute, enemy(50.0));

    attack(&mut s, &config, &FixedRng::at_angle(0.0, true), 0.0).unwrap();
    assert_eq!(s.enemy_hp(), 0.0);
    assert_eq!(s.status(), SessionStatus::Victory);

    let mut t = session(&config, brute, enemy(50.0));
    attack(&mut t, &config, &FixedRng::at_angle(0.0, false), 359.0).unwrap();
    assert_eq!(t.player_hp(), 0.0);
    assert_eq!(t.status(), SessionStatus::Defeat);
}

#[test]
fn retreat_twice_keeps_same_state() {
    let config = CombatConfig::default();
    let mut s = session(&config, player(), enemy(50.0));

    let event = CombatEngine::new(&mut s).retreat(NOW);
    assert_eq!(event.map(|e| e.kind), Some(CombatEventType::Retreated));
    let first = s.clone();

    assert!(CombatEngine::new(&mut s).retreat(NOW).is_none());
    assert_eq!(s, first);
    assert_eq!(s.status(), SessionStatus::Abandoned);

    let err = attack(&mut s, &config, &PcgRng, 0.0).unwrap_err();
    assert!(matches!(err, ExecuteError::SessionNotActive { .. }));
}

#[test]
fn same_seed_replays_identically() {
    let config = CombatConfig::default();
    let mut a = session(&config, player(), enemy(200.0));
    let mut b = a.clone();

    for angle in [3.0, 120.0, 7.0, 250.0] {
        let phase = a.current_phase();
        let env = CombatEnv::new(&config, &PcgRng, NOW);
        let left = CombatEngine::new(&mut a)
            .execute(&env, &CombatAction::new(phase, angle))
            .unwrap();
        let right = CombatEngine::new(&mut b)
            .execute(&env, &CombatAction::new(phase, angle))
            .unwrap();
        assert_eq!(left, right);
    }
    assert_eq!(a, b);
}

#[test]
fn retreat_after_victory_or_defeat_changes_nothing() {
    let config = CombatConfig::default();

    let mut won = session(&config, player(), enemy(30.0));
    attack(&mut won, &config, &FixedRng::at_angle(0.0, false), 5.0).unwrap();
    assert_eq!(won.status(), SessionStatus::Victory);

    let fragile = CombatStats::new(0.0, 50.0, 4.0, 50.0, 1.0);
    let mut lost = session(&config, fragile, enemy(100.0));
    attack(&mut lost, &config, &FixedRng::at_angle(180.0, false), 180.0).unwrap();
    defend(&mut lost, &config, &ScriptedRng::enemy_at(180.0), 180.0).unwrap();
    assert_eq!(lost.status(), SessionStatus::Defeat);

    for finished in [&mut won, &mut lost] {
        let before = finished.clone();
        assert!(CombatEngine::new(finished).retreat(NOW).is_none());
        assert!(CombatEngine::new(finished).expire(Timestamp(u64::MAX)).is_none());
        assert_eq!(*finished, before);
    }
}
