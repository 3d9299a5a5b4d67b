//! Read-only summary for glanceable surfaces.
//!
//! A widget reads the shared store directly and never writes to it. It runs
//! the same level and gauge math as the engine, but does not apply the day
//! boundary: a stale day is shown as zero rather than reset.

use crate::engine::TrackerSettings;
use crate::gauge::GaugeSpec;
use crate::history;
use crate::level::{self, SugarLevel};
use crate::store::{KeyValueStore, SugarStoreExt};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WidgetSnapshot {
    pub total_grams: i32,
    pub log_count: i32,
    pub daily_limit: i32,
    /// Gauge fill in `0.0..=1.0`
    pub fill_fraction: f64,
    /// Intake relative to the limit, capped at 1.0
    pub progress: f64,
    pub level: SugarLevel,
    pub status_label: String,
}

impl WidgetSnapshot {
    pub fn load<S: KeyValueStore + ?Sized>(
        store: &S,
        now: DateTime<Local>,
        settings: &TrackerSettings,
    ) -> Self {
        let daily_limit = store
            .daily_limit()
            .unwrap_or(settings.default_daily_limit)
            .max(1);
        let multipliers = store.threshold_multipliers();
        let today = history::log_for(&store.daily_logs(), now.date_naive());

        let gauge = GaugeSpec {
            daily_limit,
            multipliers,
            visual_capacity_multiplier: settings.visual_capacity_multiplier,
            min_visual_capacity_grams: settings.min_visual_capacity_grams,
        };
        let level = level::level_for(today.grams, daily_limit, multipliers);

        Self {
            total_grams: today.grams,
            log_count: today.count,
            daily_limit,
            fill_fraction: gauge.fill_fraction(today.grams),
            progress: gauge.limit_progress(today.grams).clamp(0.0, 1.0),
            level,
            status_label: level.status_label().to_string(),
        }
    }

    /// "22g / 36g" style summary line
    pub fn summary(&self) -> String {
        format!("{}g / {}g", self.total_grams, self.daily_limit)
    }
}
