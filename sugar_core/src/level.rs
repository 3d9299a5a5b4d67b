//! Severity levels and threshold math.
//!
//! Everything here is a pure function of `(grams, daily_limit, multipliers)`.
//! The widget recomputes levels through the same functions, so the
//! boundary formulas must stay identical for both callers.

use crate::ThresholdMultipliers;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of the day's intake, `L1` being at or under the daily limit
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SugarLevel {
    L1 = 1,
    L2 = 2,
    L3 = 3,
    L4 = 4,
    L5 = 5,
}

/// Plain RGBA colour with components in `0.0..=1.0`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

const fn rgb(r: f32, g: f32, b: f32) -> Rgba {
    Rgba { r, g, b, a: 1.0 }
}

const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Rgba {
    Rgba { r, g, b, a }
}

/// Gradient stops used to paint the liquid fill
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct LiquidPalette {
    pub top: Rgba,
    pub mid: Rgba,
    pub bottom: Rgba,
    pub surface_top: Rgba,
    pub surface_bottom: Rgba,
}

/// One-shot message shown the first time a level is reached in a day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelMessage {
    pub id: Uuid,
    pub level: SugarLevel,
    pub title: String,
    pub body: String,
}

/// A grams boundary at which the next level begins
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SugarThreshold {
    pub grams: i32,
    pub level: SugarLevel,
    pub is_dashed: bool,
}

/// A named intake band for legends
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SugarZone {
    pub name: String,
    pub range_label: String,
    pub lower_bound: i32,
    pub upper_bound: Option<i32>,
}

/// Upper gram boundaries `[b1, b2, b3, b4]` for levels 1 through 4
///
/// `b_i = round(limit * normalized_multiplier_i)`, rounding half away from
/// zero. A limit below 1 is treated as 1.
pub fn boundaries(daily_limit: i32, multipliers: ThresholdMultipliers) -> [i32; 4] {
    let limit = daily_limit.max(1) as f64;
    multipliers
        .normalized()
        .as_array()
        .map(|m| (limit * m).round() as i32)
}

/// Classify an intake against the boundaries
///
/// Each boundary is an inclusive upper bound; negative intake is `L1`.
pub fn level_for(grams: i32, daily_limit: i32, multipliers: ThresholdMultipliers) -> SugarLevel {
    let [b1, b2, b3, b4] = boundaries(daily_limit, multipliers);
    if grams <= b1 {
        SugarLevel::L1
    } else if grams <= b2 {
        SugarLevel::L2
    } else if grams <= b3 {
        SugarLevel::L3
    } else if grams <= b4 {
        SugarLevel::L4
    } else {
        SugarLevel::L5
    }
}

/// Markers for the four boundaries; only the `L5` boundary is dashed
pub fn thresholds(daily_limit: i32, multipliers: ThresholdMultipliers) -> Vec<SugarThreshold> {
    let [b1, b2, b3, b4] = boundaries(daily_limit, multipliers);
    vec![
        SugarThreshold { grams: b1, level: SugarLevel::L2, is_dashed: false },
        SugarThreshold { grams: b2, level: SugarLevel::L3, is_dashed: false },
        SugarThreshold { grams: b3, level: SugarLevel::L4, is_dashed: false },
        SugarThreshold { grams: b4, level: SugarLevel::L5, is_dashed: true },
    ]
}

/// Legend bands derived from the boundaries
pub fn zones(daily_limit: i32, multipliers: ThresholdMultipliers) -> Vec<SugarZone> {
    let [b1, b2, b3, _] = boundaries(daily_limit, multipliers);
    vec![
        SugarZone {
            name: "Healthy Zone".into(),
            range_label: format!("0-{}g", b1),
            lower_bound: 0,
            upper_bound: Some(b1),
        },
        SugarZone {
            name: "Moderate Zone".into(),
            range_label: format!("{}-{}g", b1, b2),
            lower_bound: b1,
            upper_bound: Some(b2),
        },
        SugarZone {
            name: "High Zone".into(),
            range_label: format!("{}-{}g", b2, b3),
            lower_bound: b2,
            upper_bound: Some(b3),
        },
        SugarZone {
            name: "Excess".into(),
            range_label: format!(">{}g", b3),
            lower_bound: b3,
            upper_bound: None,
        },
    ]
}

impl SugarLevel {
    pub const ALL: [SugarLevel; 5] = [
        SugarLevel::L1,
        SugarLevel::L2,
        SugarLevel::L3,
        SugarLevel::L4,
        SugarLevel::L5,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn status_label(self) -> &'static str {
        match self {
            SugarLevel::L1 => "In target",
            SugarLevel::L2 => "Caution",
            SugarLevel::L3 => "Warning",
            SugarLevel::L4 => "High",
            SugarLevel::L5 => "OMG",
        }
    }

    pub fn color(self) -> Rgba {
        match self {
            SugarLevel::L1 => rgb(0.2, 0.7, 0.3),
            SugarLevel::L2 => rgb(0.95, 0.8, 0.2),
            SugarLevel::L3 => rgb(0.95, 0.55, 0.2),
            SugarLevel::L4 => rgb(0.9, 0.2, 0.2),
            SugarLevel::L5 => rgb(0.62, 0.28, 0.84),
        }
    }

    pub fn liquid_palette(self) -> LiquidPalette {
        match self {
            SugarLevel::L1 => LiquidPalette {
                top: rgba(1.0, 0.84, 0.6, 0.95),
                mid: rgba(0.98, 0.66, 0.32, 0.96),
                bottom: rgba(0.86, 0.42, 0.2, 0.98),
                surface_top: rgba(1.0, 0.88, 0.64, 0.98),
                surface_bottom: rgba(0.95, 0.62, 0.3, 0.95),
            },
            SugarLevel::L2 => LiquidPalette {
                top: rgba(1.0, 0.76, 0.42, 0.95),
                mid: rgba(0.96, 0.55, 0.22, 0.96),
                bottom: rgba(0.82, 0.38, 0.18, 0.98),
                surface_top: rgba(1.0, 0.8, 0.46, 0.98),
                surface_bottom: rgba(0.94, 0.52, 0.22, 0.95),
            },
            SugarLevel::L3 => LiquidPalette {
                top: rgba(0.98, 0.66, 0.32, 0.95),
                mid: rgba(0.9, 0.44, 0.18, 0.96),
                bottom: rgba(0.72, 0.26, 0.14, 0.98),
                surface_top: rgba(0.98, 0.7, 0.34, 0.98),
                surface_bottom: rgba(0.86, 0.4, 0.18, 0.95),
            },
            SugarLevel::L4 | SugarLevel::L5 => LiquidPalette {
                top: rgba(0.98, 0.4, 0.32, 0.95),
                mid: rgba(0.9, 0.22, 0.18, 0.96),
                bottom: rgba(0.7, 0.12, 0.12, 0.98),
                surface_top: rgba(1.0, 0.46, 0.36, 0.98),
                surface_bottom: rgba(0.86, 0.2, 0.18, 0.95),
            },
        }
    }

    /// Message for reaching this level, or `None` for `L1`
    pub fn message(
        self,
        daily_limit: i32,
        multipliers: ThresholdMultipliers,
    ) -> Option<LevelMessage> {
        let limit = daily_limit.max(1);
        let [b1, b2, b3, b4] = boundaries(limit, multipliers);
        let body = match self {
            SugarLevel::L1 => return None,
            SugarLevel::L2 => format!(
                "Moderate Zone ({}-{}g). Over the recommended max ({}g/day).",
                b1, b2, limit
            ),
            SugarLevel::L3 => format!(
                "High Zone ({}-{}g). Typical American range (~{}x strict).",
                b2,
                b3,
                format_multiplier(b3 as f64 / limit as f64)
            ),
            SugarLevel::L4 => format!(
                "Excess Zone (>{}g). You are above the lenient ceiling.",
                b3
            ),
            SugarLevel::L5 => format!("Over {}g/day. Consider a reset tomorrow.", b4),
        };

        Some(LevelMessage {
            id: Uuid::new_v4(),
            level: self,
            title: format!("Level {} - {}", self.ordinal(), self.status_label()),
            body,
        })
    }
}

/// `4.0` -> `"4"`, `2.5` -> `"2.5"`
fn format_multiplier(value: f64) -> String {
    let text = format!("{:.1}", value);
    text.strip_suffix(".0").map(str::to_string).unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: ThresholdMultipliers = ThresholdMultipliers::DEFAULT;

    #[test]
    fn test_default_boundaries() {
        assert_eq!(boundaries(36, DEFAULT), [36, 72, 144, 180]);
    }

    #[test]
    fn test_boundaries_round_half_away_from_zero() {
        let m = ThresholdMultipliers::new(1.0, 1.5, 2.5, 3.5);
        // 25 * 1.5 = 37.5, 25 * 2.5 = 62.5, 25 * 3.5 = 87.5
        assert_eq!(boundaries(25, m), [25, 38, 63, 88]);
    }

    #[test]
    fn test_boundaries_non_decreasing() {
        let samples = [
            ThresholdMultipliers::new(3.0, 1.0, 0.0, 2.0),
            ThresholdMultipliers::new(1.0, 1.0, 1.0, 1.0),
            ThresholdMultipliers::new(0.1, 9.0, 2.0, 4.5),
            DEFAULT,
        ];
        for limit in [1, 7, 22, 36, 50, 1000] {
            for m in samples {
                let b = boundaries(limit, m);
                assert!(b.windows(2).all(|w| w[0] <= w[1]), "{:?} for {}", b, limit);
                assert!(b[0] >= limit);
            }
        }
    }

    #[test]
    fn test_level_boundaries_are_inclusive() {
        assert_eq!(level_for(36, 36, DEFAULT), SugarLevel::L1);
        assert_eq!(level_for(37, 36, DEFAULT), SugarLevel::L2);
        assert_eq!(level_for(72, 36, DEFAULT), SugarLevel::L2);
        assert_eq!(level_for(73, 36, DEFAULT), SugarLevel::L3);
        assert_eq!(level_for(144, 36, DEFAULT), SugarLevel::L3);
        assert_eq!(level_for(180, 36, DEFAULT), SugarLevel::L4);
        assert_eq!(level_for(181, 36, DEFAULT), SugarLevel::L5);
    }

    #[test]
    fn test_level_extremes() {
        assert_eq!(level_for(-50, 36, DEFAULT), SugarLevel::L1);
        assert_eq!(level_for(i32::MIN, 36, DEFAULT), SugarLevel::L1);
        assert_eq!(level_for(i32::MAX, 36, DEFAULT), SugarLevel::L5);
        assert_eq!(level_for(0, 0, DEFAULT), SugarLevel::L1);
    }

    #[test]
    fn test_level_monotonic_in_grams() {
        let m = ThresholdMultipliers::new(1.2, 2.0, 2.0, 6.3);
        for limit in [1, 10, 36] {
            let mut previous = SugarLevel::L1;
            for grams in -10..400 {
                let level = level_for(grams, limit, m);
                assert!(level >= previous);
                previous = level;
            }
        }
    }

    #[test]
    fn test_thresholds_mark_only_l5_dashed() {
        let markers = thresholds(36, DEFAULT);
        assert_eq!(markers.len(), 4);
        assert_eq!(
            markers.iter().map(|t| t.grams).collect::<Vec<_>>(),
            vec![36, 72, 144, 180]
        );
        assert_eq!(markers[0].level, SugarLevel::L2);
        assert!(markers[3].is_dashed);
        assert!(markers[..3].iter().all(|t| !t.is_dashed));
    }

    #[test]
    fn test_zones_follow_boundaries() {
        let z = zones(22, DEFAULT);
        assert_eq!(z[0].range_label, "0-22g");
        assert_eq!(z[1].range_label, "22-44g");
        assert_eq!(z[2].range_label, "44-88g");
        assert_eq!(z[3].range_label, ">88g");
        assert_eq!(z[3].upper_bound, None);
    }

    #[test]
    fn test_messages() {
        assert!(SugarLevel::L1.message(36, DEFAULT).is_none());

        let l2 = SugarLevel::L2.message(36, DEFAULT).unwrap();
        assert_eq!(l2.title, "Level 2 - Caution");
        assert_eq!(
            l2.body,
            "Moderate Zone (36-72g). Over the recommended max (36g/day)."
        );

        let l3 = SugarLevel::L3.message(36, DEFAULT).unwrap();
        assert_eq!(l3.body, "High Zone (72-144g). Typical American range (~4x strict).");

        let l5 = SugarLevel::L5.message(36, DEFAULT).unwrap();
        assert_eq!(l5.title, "Level 5 - OMG");
        assert_eq!(l5.body, "Over 180g/day. Consider a reset tomorrow.");
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = SugarLevel::L4.message(36, DEFAULT).unwrap();
        let b = SugarLevel::L4.message(36, DEFAULT).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.title, b.title);
    }

    #[test]
    fn test_l4_and_l5_share_palette() {
        assert_eq!(SugarLevel::L4.liquid_palette(), SugarLevel::L5.liquid_palette());
        assert_ne!(SugarLevel::L1.liquid_palette(), SugarLevel::L2.liquid_palette());
    }
}
