//! Balance tables and tunable combat constants.
//!
//! Every number the rules depend on (band widths, zone multipliers, crit
//! odds, reward ranges) lives in [`CombatConfig`] so it can be tuned from
//! data files without touching the engine. [`CombatConfig::validate`] must
//! pass before a config is handed to the engine; the band model and damage
//! functions assume a validated table.

use crate::combat::{ZONE_COUNT, Zone};

/// Full circle of the timing dial, in degrees.
pub const DIAL_DEGREES: f64 = 360.0;

/// Lowest accuracy the band model distinguishes. Lower stats are clamped.
pub const MIN_ACCURACY: f64 = 0.0;

/// Highest accuracy the band model distinguishes. Higher stats are clamped.
pub const MAX_ACCURACY: f64 = 100.0;

/// Tolerance used when checking that band widths add up to a full dial.
const WIDTH_SUM_EPSILON: f64 = 1e-6;

/// Complete rule set for combat resolution.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    pub bands: BandConfig,
    pub zones: ZoneTable,
    pub crit: CritConfig,
    pub rewards: RewardTable,
}

impl CombatConfig {
    /// Checks every table and returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bands.validate()?;
        self.zones.validate()?;
        self.crit.validate()?;
        self.rewards.validate()
    }
}

// ============================================================================
// Bands
// ============================================================================

/// Dial layout at baseline accuracy plus how far accuracy may skew it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BandConfig {
    /// Arc widths for zones 1..=5 at `baseline_accuracy`. Must sum to 360.
    pub base_widths: [f64; ZONE_COUNT],
    /// Accuracy at which the dial matches `base_widths` exactly.
    pub baseline_accuracy: f64,
    /// Degrees added to zone 1 at accuracy 100 (and removed at accuracy 0).
    pub max_shift_degrees: f64,
}

impl BandConfig {
    pub const DEFAULT_BASE_WIDTHS: [f64; ZONE_COUNT] = [36.0, 54.0, 126.0, 90.0, 54.0];
    pub const DEFAULT_BASELINE_ACCURACY: f64 = 50.0;
    pub const DEFAULT_MAX_SHIFT_DEGREES: f64 = 24.0;

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_widths(&self.base_widths)?;

        let baseline = self.baseline_accuracy;
        if !baseline.is_finite() || baseline <= MIN_ACCURACY || baseline >= MAX_ACCURACY {
            return Err(ConfigError::InvalidBaseline { value: baseline });
        }

        let shift = self.max_shift_degrees;
        let tail = self.base_widths[3] + self.base_widths[4];
        let limit = self.base_widths[0].min(tail);
        if !shift.is_finite() || shift < 0.0 || shift >= limit {
            return Err(ConfigError::ShiftTooLarge { shift, limit });
        }

        Ok(())
    }
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            base_widths: Self::DEFAULT_BASE_WIDTHS,
            baseline_accuracy: Self::DEFAULT_BASELINE_ACCURACY,
            max_shift_degrees: Self::DEFAULT_MAX_SHIFT_DEGREES,
        }
    }
}

/// Checks that five arc widths are positive and cover the dial exactly once.
pub(crate) fn validate_widths(widths: &[f64; ZONE_COUNT]) -> Result<(), ConfigError> {
    for (zone, &width) in Zone::ALL.iter().zip(widths.iter()) {
        if !width.is_finite() || width <= 0.0 {
            return Err(ConfigError::InvalidBandWidth { zone: *zone, width });
        }
    }

    let sum: f64 = widths.iter().sum();
    if (sum - DIAL_DEGREES).abs() > WIDTH_SUM_EPSILON {
        return Err(ConfigError::BandWidthSum { sum });
    }

    Ok(())
}

// ============================================================================
// Zones
// ============================================================================

/// Damage multiplier per zone, shared by attacks and blocks.
///
/// Zone 5 is expected to be negative: the acting combatant hurts itself.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ZoneTable {
    pub multipliers: [f64; ZONE_COUNT],
}

impl ZoneTable {
    pub const DEFAULT_MULTIPLIERS: [f64; ZONE_COUNT] = [1.5, 1.2, 1.0, 0.5, -0.3];

    #[inline]
    pub fn multiplier(&self, zone: Zone) -> f64 {
        self.multipliers[zone.slot()]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (zone, &value) in Zone::ALL.iter().zip(self.multipliers.iter()) {
            if !value.is_finite() {
                return Err(ConfigError::InvalidMultiplier { zone: *zone, value });
            }
        }

        // Better zones never pay out less than worse ones.
        for pair in Zone::ALL.windows(2) {
            if self.multiplier(pair[1]) > self.multiplier(pair[0]) {
                return Err(ConfigError::MultipliersNotOrdered { zone: pair[1] });
            }
        }

        Ok(())
    }
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self {
            multipliers: Self::DEFAULT_MULTIPLIERS,
        }
    }
}

// ============================================================================
// Critical hits
// ============================================================================

/// Crit odds and payout. Only zone 1 ever rolls.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CritConfig {
    /// Chance in percent (0-100) that a zone-1 hit is critical. Fractions
    /// are allowed; the d100 roll crits when it does not exceed this value.
    pub chance_percent: f64,
    /// Multiplier applied after the zone multiplier on a crit.
    pub multiplier: f64,
}

impl CritConfig {
    pub const DEFAULT_CHANCE_PERCENT: f64 = 15.0;
    pub const DEFAULT_MULTIPLIER: f64 = 1.5;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.chance_percent) {
            return Err(ConfigError::InvalidCritChance {
                value: self.chance_percent,
            });
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::InvalidCritMultiplier {
                value: self.multiplier,
            });
        }
        Ok(())
    }
}

impl Default for CritConfig {
    fn default() -> Self {
        Self {
            chance_percent: Self::DEFAULT_CHANCE_PERCENT,
            multiplier: Self::DEFAULT_MULTIPLIER,
        }
    }
}

// ============================================================================
// Rewards
// ============================================================================

/// Level-scaled reward ranges and the material drop table.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RewardTable {
    pub gold_min_per_level: u32,
    pub gold_max_per_level: u32,
    pub xp_base: u32,
    pub xp_per_level: u32,
    /// Share of the victory gold/xp granted on defeat, in percent.
    pub consolation_percent: u32,
    /// Every this many enemy levels add one to each dropped material stack.
    pub quantity_level_step: u32,
    pub materials: Vec<MaterialDropSpec>,
}

impl RewardTable {
    pub const DEFAULT_GOLD_MIN_PER_LEVEL: u32 = 8;
    pub const DEFAULT_GOLD_MAX_PER_LEVEL: u32 = 15;
    pub const DEFAULT_XP_BASE: u32 = 20;
    pub const DEFAULT_XP_PER_LEVEL: u32 = 10;
    pub const DEFAULT_CONSOLATION_PERCENT: u32 = 25;
    pub const DEFAULT_QUANTITY_LEVEL_STEP: u32 = 5;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gold_min_per_level > self.gold_max_per_level {
            return Err(ConfigError::InvalidGoldRange {
                min: self.gold_min_per_level,
                max: self.gold_max_per_level,
            });
        }
        if self.consolation_percent > 100 {
            return Err(ConfigError::InvalidPercent {
                field: "rewards.consolation_percent",
                value: self.consolation_percent,
            });
        }
        if self.quantity_level_step == 0 {
            return Err(ConfigError::ZeroQuantityStep);
        }
        if self.materials.len() > crate::rewards::MAX_MATERIAL_DROPS {
            return Err(ConfigError::TooManyMaterials {
                count: self.materials.len(),
                max: crate::rewards::MAX_MATERIAL_DROPS,
            });
        }
        for spec in &self.materials {
            if spec.chance_percent > 100 {
                return Err(ConfigError::InvalidPercent {
                    field: "rewards.materials.chance_percent",
                    value: spec.chance_percent,
                });
            }
        }
        Ok(())
    }
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            gold_min_per_level: Self::DEFAULT_GOLD_MIN_PER_LEVEL,
            gold_max_per_level: Self::DEFAULT_GOLD_MAX_PER_LEVEL,
            xp_base: Self::DEFAULT_XP_BASE,
            xp_per_level: Self::DEFAULT_XP_PER_LEVEL,
            consolation_percent: Self::DEFAULT_CONSOLATION_PERCENT,
            quantity_level_step: Self::DEFAULT_QUANTITY_LEVEL_STEP,
            materials: vec![
                MaterialDropSpec::new("iron_scrap", 60, 1),
                MaterialDropSpec::new("beast_hide", 35, 1),
                MaterialDropSpec::new("ember_shard", 15, 5),
                MaterialDropSpec::new("void_crystal", 5, 10),
            ],
        }
    }
}

/// One entry of the victory drop table.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialDropSpec {
    pub material: String,
    pub chance_percent: u32,
    /// Enemies below this level never drop the material.
    pub min_level: u32,
}

impl MaterialDropSpec {
    pub fn new(material: impl Into<String>, chance_percent: u32, min_level: u32) -> Self {
        Self {
            material: material.into(),
            chance_percent,
            min_level,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Rejected balance tables.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("band width for zone {zone} must be positive and finite (got {width})")]
    InvalidBandWidth { zone: Zone, width: f64 },

    #[error("band widths must sum to 360 degrees (got {sum})")]
    BandWidthSum { sum: f64 },

    #[error("baseline accuracy must lie strictly inside (0, 100) (got {value})")]
    InvalidBaseline { value: f64 },

    #[error("accuracy shift {shift} must be non-negative and below {limit} degrees")]
    ShiftTooLarge { shift: f64, limit: f64 },

    #[error("zone {zone} multiplier must be finite (got {value})")]
    InvalidMultiplier { zone: Zone, value: f64 },

    #[error("zone {zone} multiplier exceeds the multiplier of the zone before it")]
    MultipliersNotOrdered { zone: Zone },

    #[error("crit multiplier must be finite and at least 1.0 (got {value})")]
    InvalidCritMultiplier { value: f64 },

    #[error("crit chance must be a percentage in 0..=100 (got {value})")]
    InvalidCritChance { value: f64 },

    #[error("{field} must be a percentage in 0..=100 (got {value})")]
    InvalidPercent { field: &'static str, value: u32 },

    #[error("gold range per level is inverted ({min} > {max})")]
    InvalidGoldRange { min: u32, max: u32 },

    #[error("rewards.quantity_level_step must be at least 1")]
    ZeroQuantityStep,

    #[error("drop table lists {count} materials, at most {max} are supported")]
    TooManyMaterials { count: usize, max: usize },
}

impl crate::error::CombatError for ConfigError {
    fn severity(&self) -> crate::error::ErrorSeverity {
        crate::error::ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidBandWidth { .. } => "CONFIG_INVALID_BAND_WIDTH",
            Self::BandWidthSum { .. } => "CONFIG_BAND_WIDTH_SUM",
            Self::InvalidBaseline { .. } => "CONFIG_INVALID_BASELINE",
            Self::ShiftTooLarge { .. } => "CONFIG_SHIFT_TOO_LARGE",
            Self::InvalidMultiplier { .. } => "CONFIG_INVALID_MULTIPLIER",
            Self::MultipliersNotOrdered { .. } => "CONFIG_MULTIPLIERS_NOT_ORDERED",
            Self::InvalidCritMultiplier { .. } => "CONFIG_INVALID_CRIT_MULTIPLIER",
            Self::InvalidCritChance { .. } => "CONFIG_INVALID_CRIT_CHANCE",
            Self::InvalidPercent { .. } => "CONFIG_INVALID_PERCENT",
            Self::InvalidGoldRange { .. } => "CONFIG_INVALID_GOLD_RANGE",
            Self::ZeroQuantityStep => "CONFIG_ZERO_QUANTITY_STEP",
            Self::TooManyMaterials { .. } => "CONFIG_TOO_MANY_MATERIALS",
        }
    }
}
