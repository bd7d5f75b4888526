//! Dial zones and tap resolution.

use crate::config::{CritConfig, DIAL_DEGREES};
use crate::env::RngOracle;

use super::bands::WeaponBands;

/// Number of zones on the dial.
pub const ZONE_COUNT: usize = 5;

/// One of the five arcs of the timing dial, best first.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Zone {
    /// Zone 1: widest payout, the only crit-eligible arc.
    Perfect,
    /// Zone 2.
    Great,
    /// Zone 3: nominal damage.
    Good,
    /// Zone 4.
    Graze,
    /// Zone 5: the acting combatant hurts itself.
    Injure,
}

impl Zone {
    /// All zones in dial order.
    pub const ALL: [Zone; ZONE_COUNT] = [
        Zone::Perfect,
        Zone::Great,
        Zone::Good,
        Zone::Graze,
        Zone::Injure,
    ];

    /// 1-based zone number as shown to players.
    pub const fn index(self) -> u8 {
        self.slot() as u8 + 1
    }

    /// 0-based position used for table lookups.
    pub const fn slot(self) -> usize {
        match self {
            Zone::Perfect => 0,
            Zone::Great => 1,
            Zone::Good => 2,
            Zone::Graze => 3,
            Zone::Injure => 4,
        }
    }

    pub fn from_index(index: u8) -> Option<Zone> {
        match index {
            1..=5 => Some(Self::ALL[usize::from(index) - 1]),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Zone::Perfect => "perfect",
            Zone::Great => "great",
            Zone::Good => "good",
            Zone::Graze => "graze",
            Zone::Injure => "injure",
        }
    }

    pub const fn is_crit_eligible(self) -> bool {
        matches!(self, Zone::Perfect)
    }

    pub const fn is_injure(self) -> bool {
        matches!(self, Zone::Injure)
    }
}

/// Outcome of resolving one tap on the dial.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneHitResult {
    pub zone: Zone,
    pub is_critical: bool,
    /// Present only when `is_critical` is set.
    pub crit_multiplier: Option<f64>,
}

impl ZoneHitResult {
    /// Non-critical hit on `zone`.
    pub const fn plain(zone: Zone) -> Self {
        Self {
            zone,
            is_critical: false,
            crit_multiplier: None,
        }
    }

    /// Critical hit on `zone` with the given multiplier.
    pub const fn critical(zone: Zone, multiplier: f64) -> Self {
        Self {
            zone,
            is_critical: true,
            crit_multiplier: Some(multiplier),
        }
    }

    pub const fn zone_index(&self) -> u8 {
        self.zone.index()
    }

    pub const fn zone_name(&self) -> &'static str {
        self.zone.name()
    }

    /// Factor applied on top of the zone multiplier (1.0 without a crit).
    pub fn crit_factor(&self) -> f64 {
        self.crit_multiplier.unwrap_or(1.0)
    }
}

/// Tap angle that cannot be placed on the dial.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("tap angle {0} is not a finite number of degrees")]
pub struct InvalidAngle(pub f64);

/// Wrap a tap angle into `[0, 360)`.
///
/// Any finite angle is accepted and reduced modulo 360; NaN and infinities
/// are rejected.
pub fn normalize_angle(angle: f64) -> Result<f64, InvalidAngle> {
    if !angle.is_finite() {
        return Err(InvalidAngle(angle));
    }
    let wrapped = angle.rem_euclid(DIAL_DEGREES);
    // rem_euclid rounds tiny negative inputs up to exactly 360.
    if wrapped >= DIAL_DEGREES {
        Ok(0.0)
    } else {
        Ok(wrapped)
    }
}

/// Resolve a tap against a band set and roll for a crit when zone 1 is hit.
///
/// The crit roll is only drawn from `rng` when the zone is crit-eligible.
pub fn resolve_zone(
    tap_angle: f64,
    bands: &WeaponBands,
    crit: &CritConfig,
    rng: &(impl RngOracle + ?Sized),
    crit_seed: u64,
) -> Result<ZoneHitResult, InvalidAngle> {
    let angle = normalize_angle(tap_angle)?;
    let zone = bands.zone_at(angle);

    if zone.is_crit_eligible() && f64::from(rng.roll_d100(crit_seed)) <= crit.chance_percent {
        return Ok(ZoneHitResult::critical(zone, crit.multiplier));
    }

    Ok(ZoneHitResult::plain(zone))
}
