//! RNG oracle for deterministic random number generation.
//!
//! Crit rolls, the enemy's counter-strike tap and reward rolls all draw from
//! an [`RngOracle`]. Implementations are stateless: the caller derives a seed
//! per roll with [`compute_seed`] from the session seed, the session version
//! and a roll context, so replaying the same session history reproduces the
//! same rolls.

/// Roll contexts passed to [`compute_seed`].
///
/// Each random decision within one action uses its own context so the
/// rolls are independent.
pub mod roll {
    /// Crit check for the player's own tap.
    pub const PLAYER_CRIT: u32 = 0;
    /// Angle of the enemy's counter-strike tap.
    pub const ENEMY_ANGLE: u32 = 1;
    /// Crit check for the enemy's counter-strike.
    pub const ENEMY_CRIT: u32 = 2;
    /// Gold roll when rewards are computed.
    pub const REWARD_GOLD: u32 = 3;
    /// First material drop roll; entry `i` of the drop table uses `REWARD_MATERIAL + i`.
    pub const REWARD_MATERIAL: u32 = 16;
}

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be deterministic and produce the same values
/// given the same seed.
pub trait RngOracle: Send + Sync {
    /// Generate a random u32 value from a seed.
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a d100 (1-100 inclusive).
    fn roll_d100(&self, seed: u64) -> u32 {
        (self.next_u32(seed) % 100) + 1
    }

    /// Generate a random value in range [min, max] inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let span = u64::from(max - min) + 1;
        min + (u64::from(self.next_u32(seed)) % span) as u32
    }

    /// Uniform angle in `[0, 360)` degrees.
    fn roll_angle(&self, seed: u64) -> f64 {
        f64::from(self.next_u32(seed)) / U32_SPAN * crate::config::DIAL_DEGREES
    }
}

const U32_SPAN: f64 = 4_294_967_296.0;

/// PCG random number generator (PCG-XSH-RR, 64-bit state, 32-bit output).
///
/// - **Deterministic**: same seed always produces same output
/// - **Fast**: single multiply + xorshift + rotate
///
/// Reference: <https://www.pcg-random.org/>
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Oracle that returns the same value for every seed.
///
/// Used by tests and by tooling that needs to pin a tap or a crit roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedRng(pub u32);

impl FixedRng {
    /// Fixed oracle whose [`RngOracle::roll_angle`] lands on `angle` (to within
    /// a few millionths of a degree) and whose d100 roll is 1 when `crit` is set
    /// and 51 otherwise.
    pub fn at_angle(angle: f64, crit: bool) -> Self {
        let normalized = angle.rem_euclid(crate::config::DIAL_DEGREES);
        let raw = (normalized / crate::config::DIAL_DEGREES * U32_SPAN) as u64;
        let raw = raw.min(u64::from(u32::MAX)) as u32;
        let mut base = raw - raw % 100;
        // Adjust upwards so the angle never drops into the previous band,
        // except in the last few values below a full turn.
        if base > u32::MAX - 100 {
            base -= 100;
        }
        Self(if crit { base + 100 } else { base + 50 })
    }
}

impl RngOracle for FixedRng {
    fn next_u32(&self, _seed: u64) -> u32 {
        self.0
    }
}

/// Compute a deterministic seed from session components.
///
/// # Arguments
///
/// * `session_seed` - Seed fixed when the session was created
/// * `nonce` - Session version at the time of the roll
/// * `actor_id` - Combatant performing the roll (0 = player, 1 = enemy)
/// * `context` - One of the [`roll`] constants
pub fn compute_seed(session_seed: u64, nonce: u64, actor_id: u32, context: u32) -> u64 {
    // SplitMix64 / FxHash style combiners
    let mut hash = session_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= u64::from(actor_id).wrapping_mul(0x517cc1b727220a95);
    hash ^= u64::from(context).wrapping_mul(0x85ebca6b);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}
