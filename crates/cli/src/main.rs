//! Terminal driver for tap-dial encounters.
//!
//! Runs one encounter against the combat service, fed by scripted taps,
//! random taps, or angles typed on stdin, then claims the rewards.
//!
//! ```bash
//! tapdial --taps 10,180,0,200,5 --seed 7
//! tapdial --interactive --enemy 12,60,4,40,80 --level 3
//! COMBAT_DATA_DIR=./sessions tapdial --config data/combat.toml --json
//! ```
mod input;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use combat_content::ConfigLoader;
use combat_core::{CombatStats, EnemyId, PlayerId, SessionStatus};
use combat_runtime::{CombatService, RandomTaps, RuntimeConfig, ScriptedTaps, TapProvider};
use tokio::sync::broadcast::error::RecvError;

use input::StdinTaps;

/// Command line arguments for a single encounter.
#[derive(Parser, Debug)]
#[command(name = "tapdial")]
#[command(about = "Fight one turn-based tap-dial encounter")]
#[command(version)]
struct Args {
    /// Balance table (TOML or RON). Built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Player stats as attack,accuracy,defense,defense_accuracy,max_hp
    #[arg(long, default_value = "20,50,4,50,100", value_parser = parse_stats)]
    player: CombatStats,

    /// Enemy stats as attack,accuracy,defense,defense_accuracy,max_hp
    #[arg(long, default_value = "10,50,5,50,60", value_parser = parse_stats)]
    enemy: CombatStats,

    /// Enemy level used for rewards
    #[arg(short, long, default_value_t = 1)]
    level: u32,

    /// Seed for sessions and random taps
    #[arg(short, long, env = "COMBAT_RNG_SEED")]
    seed: Option<u64>,

    /// Comma-separated tap angles in degrees
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    taps: Vec<f64>,

    /// Read taps from stdin
    #[arg(short, long, conflicts_with = "taps")]
    interactive: bool,

    /// Stop after this many taps and retreat
    #[arg(long, default_value_t = 200)]
    max_actions: usize,

    /// Print the final session and rewards as JSON instead of a log
    #[arg(long)]
    json: bool,
}

fn parse_stats(value: &str) -> Result<CombatStats, String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid number: {}", err))?;

    match parts[..] {
        [attack, accuracy, defense, defense_accuracy, max_hp] => Ok(CombatStats::new(
            attack,
            accuracy,
            defense,
            defense_accuracy,
            max_hp,
        )),
        _ => Err(format!("expected 5 comma-separated values, got {}", parts.len())),
    }
}

/// Upper bound on the printer's event backlog.
const MAX_EVENT_BUFFER: usize = 1 << 16;

/// Every tap yields at most four events; buffer the whole fight up to the cap.
fn event_buffer_for(max_actions: usize, configured: usize) -> usize {
    let wanted = max_actions.saturating_mul(4).saturating_add(8);
    configured.max(wanted).min(MAX_EVENT_BUFFER)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = RuntimeConfig::from_env();
    if let Some(path) = &args.config {
        config.combat = ConfigLoader::load(path)?;
    }
    if let Some(seed) = args.seed {
        config = config.with_rng_seed(seed);
    }
    config.event_buffer_size = event_buffer_for(args.max_actions, config.event_buffer_size);

    let service = CombatService::new(config).context("Failed to start combat service")?;
    let mut feed = service.subscribe_events();

    let printer = (!args.json).then(|| {
        tokio::spawn(async move {
            loop {
                match feed.recv().await {
                    Ok(event) => println!("{}", render::describe(&event)),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!("Event printer skipped {} events", missed)
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    let session = service
        .create_session_with_level(PlayerId(1), EnemyId(1), args.player, args.enemy, args.level)
        .await?;
    tracing::info!("Session {} started", session.id());

    let provider: Box<dyn TapProvider> = if args.interactive {
        Box::new(StdinTaps::new())
    } else if !args.taps.is_empty() {
        Box::new(ScriptedTaps::new(args.taps.iter().copied()))
    } else {
        match args.seed {
            Some(seed) => Box::new(RandomTaps::seeded(seed)),
            None => Box::new(RandomTaps::from_entropy()),
        }
    };

    let mut session = service
        .run_encounter(session.id(), provider.as_ref(), args.max_actions)
        .await?;
    if session.status() == SessionStatus::Active {
        session = service.retreat(session.id()).await?;
    }

    let rewards = service.claim_rewards(session.id()).await?;

    // Closing the bus lets the printer drain and exit.
    drop(service);
    if let Some(printer) = printer {
        printer.await.context("Event printer failed")?;
    }

    if args.json {
        let report = serde_json::json!({
            "session": session,
            "rewards": rewards,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render::summary(&session, &rewards));
    }

    Ok(())
}
