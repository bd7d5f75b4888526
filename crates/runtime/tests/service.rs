use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use combat_core::{
    CombatConfig, CombatEngine, CombatEventType, CombatPhase, CombatSession, CombatStats,
    EnemyId, ExecuteError, FixedRng, PlayerId, RewardError, SessionId, SessionStatus, Timestamp,
    Zone,
};
use combat_runtime::{
    ActionReport, CombatService, InMemorySessionRepo, ManualClock, RandomTaps, RepositoryError,
    RuntimeConfig, RuntimeError, ScriptedTaps, SessionRepository, StorageConfig, Topic,
};

const START: Timestamp = Timestamp(1_700_000_000_000);

fn player() -> CombatStats {
    CombatStats::new(20.0, 50.0, 4.0, 50.0, 100.0)
}

fn enemy(max_hp: f64) -> CombatStats {
    CombatStats::new(10.0, 50.0, 5.0, 50.0, max_hp)
}

/// Service whose rolls all land on `angle` without crits.
fn service_with(rng_angle: f64, clock: Arc<ManualClock>, config: RuntimeConfig) -> CombatService {
    CombatService::builder()
        .config(config.with_rng_seed(7))
        .clock(clock)
        .rng(Arc::new(FixedRng::at_angle(rng_angle, false)))
        .build()
        .unwrap()
}

fn service() -> (CombatService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START));
    let service = service_with(180.0, clock.clone(), RuntimeConfig::default());
    (service, clock)
}

#[tokio::test]
async fn create_session_starts_fresh_encounter() {
    let (service, _clock) = service();
    let mut lifecycle = service.events().subscribe(Topic::Lifecycle);

    let session = service
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(50.0))
        .await
        .unwrap();

    assert_eq!(session.status(), SessionStatus::Active);
    assert_eq!(session.current_phase(), CombatPhase::PlayerAttack);
    assert_eq!(session.turn_number(), 1);
    assert_eq!(session.player_hp(), 100.0);
    assert_eq!(session.enemy_hp(), 50.0);
    assert_eq!(session.created_at(), START);
    assert_eq!(
        session.expires_at(),
        Some(Timestamp(START.0 + 15 * 60 * 1_000))
    );

    let event = lifecycle.recv().await.unwrap();
    assert_eq!(event.session_id, session.id());
    assert_eq!(
        event.kind,
        CombatEventType::SessionStarted {
            player_id: PlayerId(1),
            enemy_id: EnemyId(2),
        }
    );
}

#[tokio::test]
async fn invalid_stats_are_rejected() {
    let (service, _clock) = service();
    let broken = CombatStats::new(f64::NAN, 50.0, 4.0, 50.0, 100.0);

    let err = service
        .create_session(PlayerId(1), EnemyId(2), broken, enemy(50.0))
        .await
        .unwrap_err();

    assert!(matches!(err, RuntimeError::InvalidSession(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn full_turn_is_persisted() {
    let (service, _clock) = service();
    let session = service
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(50.0))
        .await
        .unwrap();
    let id = session.id();

    let report = service
        .submit_action(id, CombatPhase::PlayerAttack, 180.0)
        .await
        .unwrap();
    assert_eq!(report.zone_hit.zone, Zone::Good);
    assert_eq!(report.damage.final_damage, 20.0);
    assert_eq!(report.session.enemy_hp(), 30.0);
    assert_eq!(report.session.current_phase(), CombatPhase::PlayerDefense);

    // Enemy strikes Good for 10, player blocks Good for 4.
    let report = service
        .submit_action(id, CombatPhase::PlayerDefense, 180.0)
        .await
        .unwrap();
    let strike = report.enemy_strike.unwrap();
    assert_eq!(strike.incoming, 10.0);
    assert_eq!(report.damage.blocked, 4.0);
    assert_eq!(report.session.player_hp(), 94.0);
    assert_eq!(report.session.turn_number(), 2);

    let stored = service.session(id).await.unwrap();
    assert_eq!(stored, report.session);
    assert_eq!(stored.version(), 2);
}

#[tokio::test]
async fn rejected_action_leaves_store_untouched() {
    let (service, _clock) = service();
    let session = service
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(50.0))
        .await
        .unwrap();

    let err = service
        .submit_action(session.id(), CombatPhase::PlayerDefense, 10.0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Execute(ExecuteError::PhaseMismatch { .. })
    ));
    assert!(err.is_client_error());

    let err = service
        .submit_action(session.id(), CombatPhase::PlayerAttack, f64::INFINITY)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Execute(ExecuteError::InvalidInput(_))
    ));

    assert_eq!(service.session(session.id()).await.unwrap(), session);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (service, _clock) = service();
    let id = SessionId::new();

    let err = service
        .submit_action(id, CombatPhase::PlayerAttack, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::SessionNotFound(missing) if missing == id));
    assert!(matches!(
        service.retreat(id).await,
        Err(RuntimeError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn idle_session_expires_lazily() {
    let clock = Arc::new(ManualClock::new(START));
    let config = RuntimeConfig::default().with_session_ttl(Some(Duration::from_secs(30)));
    let service = service_with(180.0, clock.clone(), config);
    let mut lifecycle = service.events().subscribe(Topic::Lifecycle);

    let session = service
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(50.0))
        .await
        .unwrap();
    lifecycle.recv().await.unwrap();

    // Activity pushes the deadline out.
    clock.advance(Duration::from_secs(20));
    service
        .submit_action(session.id(), CombatPhase::PlayerAttack, 180.0)
        .await
        .unwrap();
    clock.advance(Duration::from_secs(20));
    assert_eq!(
        service.session(session.id()).await.unwrap().status(),
        SessionStatus::Active
    );

    clock.advance(Duration::from_secs(31));
    let err = service
        .submit_action(session.id(), CombatPhase::PlayerDefense, 180.0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Execute(ExecuteError::SessionNotActive {
            status: SessionStatus::Abandoned,
            ..
        })
    ));

    let stored = service.session(session.id()).await.unwrap();
    assert_eq!(stored.status(), SessionStatus::Abandoned);
    assert_eq!(stored.version(), 2);
    assert_eq!(lifecycle.recv().await.unwrap().kind, CombatEventType::Expired);
}

#[tokio::test]
async fn retreat_is_idempotent_and_claims_nothing() {
    let (service, _clock) = service();
    let session = service
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(50.0))
        .await
        .unwrap();

    let first = service.retreat(session.id()).await.unwrap();
    let second = service.retreat(session.id()).await.unwrap();
    assert_eq!(first.status(), SessionStatus::Abandoned);
    assert_eq!(first, second);

    let rewards = service.claim_rewards(session.id()).await.unwrap();
    assert!(rewards.is_empty());
    assert!(matches!(
        service.session(session.id()).await,
        Err(RuntimeError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn victory_pays_out_once() {
    let clock = Arc::new(ManualClock::new(START));
    let service = service_with(0.0, clock, RuntimeConfig::default());
    let session = service
        .create_session_with_level(PlayerId(1), EnemyId(2), player(), enemy(30.0), 4)
        .await
        .unwrap();

    let err = service.claim_rewards(session.id()).await.unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Rewards(RewardError::NotTerminal { .. })
    ));

    let report = service
        .submit_action(session.id(), CombatPhase::PlayerAttack, 0.0)
        .await
        .unwrap();
    assert_eq!(report.session.status(), SessionStatus::Victory);
    assert_eq!(
        report.events.last().map(|e| &e.kind),
        Some(&CombatEventType::Victory)
    );

    let err = service
        .submit_action(session.id(), CombatPhase::PlayerDefense, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Execute(ExecuteError::SessionNotActive { .. })
    ));

    let rewards = service.claim_rewards(session.id()).await.unwrap();
    assert_eq!(rewards.outcome, SessionStatus::Victory);
    assert!((32..=60).contains(&rewards.gold));
    assert_eq!(rewards.experience, 60);

    assert!(matches!(
        service.claim_rewards(session.id()).await,
        Err(RuntimeError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn discard_requires_finished_session() {
    let (service, _clock) = service();
    let session = service
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(50.0))
        .await
        .unwrap();

    assert!(matches!(
        service.discard(session.id()).await,
        Err(RuntimeError::SessionStillActive { .. })
    ));

    service.retreat(session.id()).await.unwrap();
    service.discard(session.id()).await.unwrap();
    assert!(service.session(session.id()).await.is_err());
}

#[tokio::test]
async fn concurrent_taps_are_serialized() {
    let (service, _clock) = service();
    let service = Arc::new(service);
    let session = service
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(500.0))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&service);
        let id = session.id();
        tasks.push(tokio::spawn(async move {
            service
                .submit_action(id, CombatPhase::PlayerAttack, 180.0)
                .await
        }));
    }

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(RuntimeError::Execute(ExecuteError::PhaseMismatch { .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(accepted, 1);
    let stored = service.session(session.id()).await.unwrap();
    assert_eq!(stored.version(), 1);
    assert_eq!(stored.enemy_hp(), 480.0);
}

/// Store that lets a foreign writer sneak in before the first save.
struct RacingRepo {
    inner: InMemorySessionRepo,
    raced: AtomicBool,
}

impl SessionRepository for RacingRepo {
    fn insert(&self, session: &CombatSession) -> Result<(), RepositoryError> {
        self.inner.insert(session)
    }

    fn load(&self, id: SessionId) -> Result<Option<CombatSession>, RepositoryError> {
        self.inner.load(id)
    }

    fn save_if_version(
        &self,
        session: &CombatSession,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        if !self.raced.swap(true, Ordering::SeqCst)
            && let Some(mut foreign) = self.inner.load(session.id())?
        {
            let version = foreign.version();
            CombatEngine::new(&mut foreign).retreat(Timestamp(0));
            self.inner.save_if_version(&foreign, version)?;
        }
        self.inner.save_if_version(session, expected_version)
    }

    fn delete(&self, id: SessionId) -> Result<bool, RepositoryError> {
        self.inner.delete(id)
    }

    fn exists(&self, id: SessionId) -> bool {
        self.inner.exists(id)
    }
}

#[tokio::test]
async fn lost_race_surfaces_concurrent_modification() {
    let service = CombatService::builder()
        .repository(Arc::new(RacingRepo {
            inner: InMemorySessionRepo::new(),
            raced: AtomicBool::new(false),
        }))
        .clock(Arc::new(ManualClock::new(START)))
        .build()
        .unwrap();
    let session = service
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(50.0))
        .await
        .unwrap();

    let err = service
        .submit_action(session.id(), CombatPhase::PlayerAttack, 100.0)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::ConcurrentModification {
            expected: 0,
            found: Some(1),
            ..
        }
    ));
    assert!(!err.is_client_error());
    assert_eq!(
        service.session(session.id()).await.unwrap().status(),
        SessionStatus::Abandoned
    );
}

#[tokio::test]
async fn file_storage_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config =
        RuntimeConfig::default().with_storage(StorageConfig::File(dir.path().to_path_buf()));
    let clock = Arc::new(ManualClock::new(START));

    let first = service_with(180.0, clock.clone(), config.clone());
    let session = first
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(50.0))
        .await
        .unwrap();
    first
        .submit_action(session.id(), CombatPhase::PlayerAttack, 180.0)
        .await
        .unwrap();
    drop(first);

    let second = service_with(180.0, clock, config);
    let restored = second.session(session.id()).await.unwrap();
    assert_eq!(restored.enemy_hp(), 30.0);
    assert_eq!(restored.current_phase(), CombatPhase::PlayerDefense);
}

#[tokio::test]
async fn scripted_encounter_runs_to_the_end() {
    let (service, _clock) = service();
    let session = service
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(40.0))
        .await
        .unwrap();

    // Two Good attacks (20 each) around one defense.
    let taps = ScriptedTaps::new([180.0, 180.0, 180.0, 180.0]);
    let finished = service
        .run_encounter(session.id(), &taps, 100)
        .await
        .unwrap();

    assert_eq!(finished.status(), SessionStatus::Victory);
    assert_eq!(finished.enemy_hp(), 0.0);
    assert_eq!(taps.remaining(), 1);
}

#[tokio::test]
async fn random_encounter_stops_when_taps_run_out_or_session_ends() {
    let clock = Arc::new(ManualClock::new(START));
    let service = CombatService::builder()
        .config(RuntimeConfig::default().with_rng_seed(99))
        .clock(clock)
        .build()
        .unwrap();
    let session = service
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(80.0))
        .await
        .unwrap();

    let finished = service
        .run_encounter(session.id(), &RandomTaps::seeded(5), 500)
        .await
        .unwrap();

    assert!(finished.status().is_terminal());
    assert!(finished.is_consistent());
}

#[tokio::test]
async fn invalid_balance_table_fails_fast() {
    let mut combat = CombatConfig::default();
    combat.crit.chance_percent = 150.0;

    let err = CombatService::new(RuntimeConfig::default().with_combat(combat))
        .err()
        .unwrap();
    assert!(matches!(err, RuntimeError::InvalidConfig(_)));
}

#[tokio::test]
async fn standalone_rewards_follow_outcome() {
    let (service, _clock) = service();

    let defeat = service.compute_rewards(2, SessionStatus::Defeat).unwrap();
    assert!(defeat.materials.is_empty());
    assert_eq!(defeat.experience, 10);

    assert!(matches!(
        service.compute_rewards(2, SessionStatus::Active),
        Err(RuntimeError::Rewards(_))
    ));
}

#[tokio::test]
async fn reward_previews_leave_session_seeds_alone() {
    let clock = Arc::new(ManualClock::new(START));
    let quiet = service_with(180.0, clock.clone(), RuntimeConfig::default());
    let curious = service_with(180.0, clock, RuntimeConfig::default());

    let first = curious.compute_rewards(6, SessionStatus::Victory).unwrap();
    for level in 1..20 {
        curious.compute_rewards(level, SessionStatus::Victory).unwrap();
    }
    assert_eq!(
        curious.compute_rewards(6, SessionStatus::Victory).unwrap(),
        first
    );

    let a = quiet
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(50.0))
        .await
        .unwrap();
    let b = curious
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(50.0))
        .await
        .unwrap();
    assert_eq!(a.seed(), b.seed());
}

#[tokio::test]
async fn action_report_survives_json_round_trip() {
    let (service, _clock) = service();
    let session = service
        .create_session(PlayerId(1), EnemyId(2), player(), enemy(50.0))
        .await
        .unwrap();
    service
        .submit_action(session.id(), CombatPhase::PlayerAttack, 180.0)
        .await
        .unwrap();
    let report = service
        .submit_action(session.id(), CombatPhase::PlayerDefense, 180.0)
        .await
        .unwrap();

    let json = serde_json::to_string(&report).unwrap();
    let restored: ActionReport = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, report);
    assert!(restored.session.is_consistent());

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["events"][0]["kind"]["type"], "player_struck");
    assert_eq!(value["damage"]["blocked"], 4.0);
}
