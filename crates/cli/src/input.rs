//! Tap provider fed from standard input.
use async_trait::async_trait;
use combat_core::{CombatPhase, CombatSession};
use combat_runtime::{RuntimeError, TapProvider};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Reads one angle per line. `q` or end of input closes the provider.
pub struct StdinTaps {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl StdinTaps {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

#[async_trait]
impl TapProvider for StdinTaps {
    async fn provide_tap(&self, session: &CombatSession) -> combat_runtime::Result<f64> {
        // Let the event printer catch up before prompting.
        tokio::task::yield_now().await;

        let mut lines = self.lines.lock().await;
        loop {
            let verb = match session.current_phase() {
                CombatPhase::PlayerAttack => "attack",
                CombatPhase::PlayerDefense => "block",
            };
            println!(
                "turn {} | hp {:.1} vs {:.1} | {} angle (0-360, q to retreat):",
                session.turn_number(),
                session.player_hp(),
                session.enemy_hp(),
                verb
            );

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Err(RuntimeError::TapProviderClosed),
                Err(err) => {
                    tracing::warn!("Failed to read tap from stdin: {}", err);
                    return Err(RuntimeError::TapProviderClosed);
                }
            };

            let input = line.trim();
            if input.eq_ignore_ascii_case("q") {
                return Err(RuntimeError::TapProviderClosed);
            }
            match input.parse::<f64>() {
                Ok(angle) if angle.is_finite() => return Ok(angle),
                _ => println!("'{}' is not an angle", input),
            }
        }
    }
}
