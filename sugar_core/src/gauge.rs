//! Liquid-fill gauge math.
//!
//! Converts grams into fractions of the gauge's visual capacity and
//! positions the threshold rings on it.

use crate::level::{self, Rgba, SugarLevel};
use crate::ThresholdMultipliers;
use serde::{Deserialize, Serialize};

/// Markers closer than this (in gauge fraction) to the recommended line are hidden
pub const MARKER_TOLERANCE: f64 = 0.01;

/// Gauge sizing parameters
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GaugeSpec {
    pub daily_limit: i32,
    pub multipliers: ThresholdMultipliers,
    pub visual_capacity_multiplier: f64,
    pub min_visual_capacity_grams: i32,
}

/// A threshold ring positioned on the gauge
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ThresholdMarker {
    pub grams: i32,
    pub fraction: f64,
    pub level: SugarLevel,
    pub color: Rgba,
    pub is_dashed: bool,
}

impl GaugeSpec {
    /// Grams represented by a completely full gauge
    ///
    /// The gauge always reaches at least the `L5` boundary.
    pub fn visual_capacity_grams(&self) -> i32 {
        let l5 = self.multipliers.normalized().l5;
        let base = self.visual_capacity_multiplier.max(1.0).max(l5);
        ((self.daily_limit.max(1) as f64 * base) as i32).max(self.min_visual_capacity_grams)
    }

    /// Fill level in `0.0..=1.0`
    pub fn fill_fraction(&self, total_grams: i32) -> f64 {
        let capacity = self.visual_capacity_grams();
        if capacity <= 0 {
            return 0.0;
        }
        (total_grams.max(0) as f64 / capacity as f64).min(1.0)
    }

    /// Intake relative to the daily limit; exceeds 1.0 once over the limit
    pub fn limit_progress(&self, total_grams: i32) -> f64 {
        total_grams as f64 / self.daily_limit.max(1) as f64
    }

    /// Position of the daily-limit line
    pub fn recommended_fraction(&self) -> f64 {
        let capacity = self.visual_capacity_grams();
        if capacity <= 0 {
            return 0.0;
        }
        self.daily_limit.max(1) as f64 / capacity as f64
    }

    /// Threshold rings, minus any that would overlap the recommended line
    pub fn threshold_markers(&self) -> Vec<ThresholdMarker> {
        let capacity = self.visual_capacity_grams();
        if capacity <= 0 {
            return Vec::new();
        }
        let capacity = capacity as f64;
        let recommended = self.recommended_fraction();

        level::thresholds(self.daily_limit, self.multipliers)
            .into_iter()
            .map(|t| ThresholdMarker {
                grams: t.grams,
                fraction: (t.grams as f64 / capacity).min(1.0),
                level: t.level,
                color: t.level.color(),
                is_dashed: t.is_dashed,
            })
            .filter(|m| (m.fraction - recommended).abs() > MARKER_TOLERANCE)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(daily_limit: i32) -> GaugeSpec {
        GaugeSpec {
            daily_limit,
            multipliers: ThresholdMultipliers::DEFAULT,
            visual_capacity_multiplier: 5.0,
            min_visual_capacity_grams: 180,
        }
    }

    #[test]
    fn test_capacity_uses_minimum() {
        assert_eq!(spec(36).visual_capacity_grams(), 180);
        assert_eq!(spec(22).visual_capacity_grams(), 180);
        assert_eq!(spec(50).visual_capacity_grams(), 250);
    }

    #[test]
    fn test_capacity_follows_larger_l5() {
        let mut s = spec(36);
        s.multipliers = ThresholdMultipliers::new(1.0, 2.0, 4.0, 8.0);
        assert_eq!(s.visual_capacity_grams(), 288);
    }

    #[test]
    fn test_fill_fraction_clamped() {
        let s = spec(36);
        assert_eq!(s.fill_fraction(0), 0.0);
        assert!((s.fill_fraction(90) - 0.5).abs() < 1e-9);
        assert_eq!(s.fill_fraction(500), 1.0);
        assert_eq!(s.fill_fraction(-5), 0.0);
    }

    #[test]
    fn test_limit_progress_unclamped() {
        let s = spec(36);
        assert!((s.limit_progress(18) - 0.5).abs() < 1e-9);
        assert!((s.limit_progress(72) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_marker_at_recommended_line_is_dropped() {
        // Default l2 multiplier of 1.0 puts the first marker on the limit line
        let markers = spec(36).threshold_markers();
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].level, SugarLevel::L3);
        assert!(markers.last().unwrap().is_dashed);
        assert_eq!(markers.last().unwrap().fraction, 1.0);
    }

    #[test]
    fn test_marker_kept_outside_tolerance() {
        let mut s = spec(100);
        // capacity 500; l2 boundary 110 -> 0.22 vs recommended 0.2
        s.multipliers = ThresholdMultipliers::new(1.1, 2.0, 4.0, 5.0);
        let markers = s.threshold_markers();
        assert_eq!(markers.len(), 4);

        // l2 boundary 103 -> 0.206, within 0.01 of 0.2
        s.multipliers = ThresholdMultipliers::new(1.03, 2.0, 4.0, 5.0);
        let markers = s.threshold_markers();
        assert_eq!(markers.len(), 3);
    }
}
