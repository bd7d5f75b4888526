//! Weapon band model: accuracy to dial layout.
//!
//! A [`WeaponBands`] value partitions `[0, 360)` into five contiguous
//! half-open arcs laid out in zone order from 0 degrees:
//!
//! ```text
//! zone 1: [0, s1)   zone 2: [s1, s2)   zone 3: [s2, s3)   zone 4: [s3, s4)   zone 5: [s4, 360)
//! ```
//!
//! # Accuracy skew
//!
//! ```text
//! shift = max_shift * (acc - baseline) / (100 - baseline)   if acc >= baseline
//! shift = max_shift * (acc - baseline) / baseline            otherwise
//!
//! zone 1 += shift
//! zone 4 -= shift * base4 / (base4 + base5)
//! zone 5  = 360 - (zone 1 + zone 2 + zone 3 + zone 4)
//! ```
//!
//! Zones 2 and 3 keep their base widths. With a validated [`BandConfig`]
//! every width stays strictly positive for any accuracy.

use crate::config::{
    BandConfig, ConfigError, DIAL_DEGREES, MAX_ACCURACY, MIN_ACCURACY, validate_widths,
};

use super::zone::{ZONE_COUNT, Zone};

/// Start angles of the five zones on the dial.
///
/// Invariant: `starts[0] == 0`, strictly increasing, `starts[4] < 360`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponBands {
    starts: [f64; ZONE_COUNT],
}

impl WeaponBands {
    /// Lay out the dial for an accuracy stat.
    ///
    /// Accuracy outside `[0, 100]` is clamped (equipment bonuses may push
    /// stats past the nominal range); NaN is treated as the baseline.
    /// `config` is expected to have passed [`BandConfig::validate`].
    pub fn from_accuracy(accuracy: f64, config: &BandConfig) -> Self {
        let baseline = config.baseline_accuracy;
        let accuracy = if accuracy.is_nan() {
            baseline
        } else {
            accuracy.clamp(MIN_ACCURACY, MAX_ACCURACY)
        };

        let shift = if accuracy >= baseline {
            config.max_shift_degrees * (accuracy - baseline) / (MAX_ACCURACY - baseline)
        } else {
            config.max_shift_degrees * (accuracy - baseline) / (baseline - MIN_ACCURACY)
        };

        let base = config.base_widths;
        let tail = base[3] + base[4];

        let mut widths = base;
        widths[0] = base[0] + shift;
        widths[3] = base[3] - shift * base[3] / tail;
        widths[4] = DIAL_DEGREES - (widths[0] + widths[1] + widths[2] + widths[3]);

        Self::layout(&widths)
    }

    /// Build bands from explicit arc widths (zone 1 first).
    pub fn from_widths(widths: [f64; ZONE_COUNT]) -> Result<Self, ConfigError> {
        validate_widths(&widths)?;
        Ok(Self::layout(&widths))
    }

    fn layout(widths: &[f64; ZONE_COUNT]) -> Self {
        let mut starts = [0.0; ZONE_COUNT];
        for slot in 1..ZONE_COUNT {
            starts[slot] = starts[slot - 1] + widths[slot - 1];
        }
        Self { starts }
    }

    /// Start angle of every zone, zone 1 first.
    pub fn boundaries(&self) -> [f64; ZONE_COUNT] {
        self.starts
    }

    /// Arc widths in degrees, zone 1 first.
    pub fn widths(&self) -> [f64; ZONE_COUNT] {
        let mut widths = [0.0; ZONE_COUNT];
        for (slot, width) in widths.iter_mut().enumerate() {
            *width = self.arc_end(slot) - self.starts[slot];
        }
        widths
    }

    /// Half-open arc `[start, end)` covered by `zone`.
    pub fn arc(&self, zone: Zone) -> (f64, f64) {
        let slot = zone.slot();
        (self.starts[slot], self.arc_end(slot))
    }

    fn arc_end(&self, slot: usize) -> f64 {
        self.starts.get(slot + 1).copied().unwrap_or(DIAL_DEGREES)
    }

    /// Zone containing an angle already normalized into `[0, 360)`.
    pub fn zone_at(&self, angle: f64) -> Zone {
        Zone::ALL
            .iter()
            .rev()
            .zip(self.starts.iter().rev())
            .find(|&(_, &start)| angle >= start)
            .map(|(&zone, _)| zone)
            .unwrap_or(Zone::Perfect)
    }

    /// True when the layout still satisfies the partition invariant.
    pub fn is_partition(&self) -> bool {
        self.starts[0] == 0.0
            && self.starts.windows(2).all(|pair| pair[0] < pair[1])
            && self.starts[ZONE_COUNT - 1] < DIAL_DEGREES
    }
}
