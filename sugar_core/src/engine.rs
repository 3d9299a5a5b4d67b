//! Daily sugar-tracking engine.
//!
//! `SugarTracker` owns the day's running total, the configured limit and
//! multipliers, the item catalog with its featured ranking, and the
//! midnight reset timer. It is single-threaded and non-reentrant: the host
//! calls one operation at a time, timer fires included.
//!
//! Store failures never block an operation. Reads fall back to defaults;
//! failed writes are queued as [`StoreWarning`]s for the host to drain.

use crate::calendar::{next_midnight_after, start_of_day};
use crate::catalog::{Catalog, FeaturedItems};
use crate::config::TrackerConfig;
use crate::gauge::{GaugeSpec, ThresholdMarker};
use crate::history::{self, date_key};
use crate::level::{self, LevelMessage, LiquidPalette, SugarLevel};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::store::{keys, KeyValueStore, LogHistory, StoreWarning, SugarStoreExt};
use crate::{DailySugarLog, Result, Serving, SugarItem, SugarItemCategory, ThresholdMultipliers};
use chrono::{DateTime, Local, NaiveDate};

/// Construction parameters for the engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerSettings {
    /// Limit used until the user stores one
    pub default_daily_limit: i32,
    pub visual_capacity_multiplier: f64,
    pub min_visual_capacity_grams: i32,
    pub featured_capacity: usize,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::from(&TrackerConfig::default())
    }
}

impl From<&TrackerConfig> for TrackerSettings {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            default_daily_limit: config.default_daily_limit.max(1),
            visual_capacity_multiplier: config.visual_capacity_multiplier.max(1.0),
            min_visual_capacity_grams: config.min_visual_capacity_grams,
            featured_capacity: config.featured_capacity.max(1),
        }
    }
}

/// State of the midnight reset timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetTimerState {
    Idle,
    Scheduled {
        handle: TimerHandle,
        at: DateTime<Local>,
    },
}

/// Result of logging one item
#[derive(Clone, Debug, PartialEq)]
pub struct LogOutcome {
    pub item_name: String,
    pub grams_added: i32,
    pub total_grams: i32,
    pub log_count: i32,
    pub level: SugarLevel,
    /// Set when this log moved the day into a level not yet announced
    pub level_message: Option<LevelMessage>,
    /// True when a stale day was reset before accumulating
    pub reset_before_logging: bool,
}

/// The daily sugar-tracking state engine
pub struct SugarTracker<S: KeyValueStore, T: Scheduler> {
    store: S,
    scheduler: T,
    settings: TrackerSettings,
    total_grams: i32,
    log_count: i32,
    daily_limit: i32,
    multipliers: ThresholdMultipliers,
    catalog: Catalog,
    featured: FeaturedItems,
    last_notified_level: SugarLevel,
    /// Calendar day the running total belongs to
    log_day: NaiveDate,
    pending_message: Option<LevelMessage>,
    timer: ResetTimerState,
    warnings: Vec<StoreWarning>,
}

impl<S: KeyValueStore, T: Scheduler> SugarTracker<S, T> {
    /// Hydrate an engine from the store and run the day-boundary check
    pub fn new(store: S, scheduler: T, settings: TrackerSettings, now: DateTime<Local>) -> Self {
        let daily_limit = store
            .daily_limit()
            .unwrap_or(settings.default_daily_limit)
            .max(1);
        let multipliers = store.threshold_multipliers();

        let custom = store.custom_items().into_iter().map(SugarItem::from).collect();
        let catalog = Catalog::with_builtins(custom);

        let stored_featured = store.recent_items();
        let featured =
            FeaturedItems::restore(stored_featured.clone(), settings.featured_capacity, &catalog);

        // A clock behind the last reset keeps writing to the reset day
        let log_day = match store.last_reset_date() {
            Some(last) if last.date_naive() > now.date_naive() => last.date_naive(),
            _ => now.date_naive(),
        };
        let today = history::log_for(&store.daily_logs(), log_day);

        let mut tracker = Self {
            store,
            scheduler,
            settings,
            total_grams: today.grams,
            log_count: today.count,
            daily_limit,
            multipliers,
            catalog,
            featured,
            last_notified_level: SugarLevel::L1,
            log_day,
            pending_message: None,
            timer: ResetTimerState::Idle,
            warnings: Vec::new(),
        };

        if tracker.featured.names() != stored_featured.as_slice() {
            tracker.persist_featured();
        }

        // Levels reached earlier today were already announced
        tracker.last_notified_level = tracker.current_level();

        tracing::info!(
            "Hydrated tracker: {}g over {} logs, limit {}g, {} custom items",
            tracker.total_grams,
            tracker.log_count,
            tracker.daily_limit,
            tracker.catalog.custom().len()
        );

        tracker.ensure_daily_reset(now);
        tracker
    }

    // ========================================================================
    // Derived values
    // ========================================================================

    pub fn total_grams_today(&self) -> i32 {
        self.total_grams
    }

    pub fn log_count_today(&self) -> i32 {
        self.log_count
    }

    pub fn daily_limit(&self) -> i32 {
        self.daily_limit
    }

    pub fn threshold_multipliers(&self) -> ThresholdMultipliers {
        self.multipliers
    }

    pub fn current_level(&self) -> SugarLevel {
        level::level_for(self.total_grams, self.daily_limit, self.multipliers)
    }

    /// Highest level already announced today
    pub fn last_notified_level(&self) -> SugarLevel {
        self.last_notified_level
    }

    /// Calendar day the running total is recorded under
    pub fn log_day(&self) -> NaiveDate {
        self.log_day
    }

    pub fn boundaries(&self) -> [i32; 4] {
        level::boundaries(self.daily_limit, self.multipliers)
    }

    pub fn gauge(&self) -> GaugeSpec {
        GaugeSpec {
            daily_limit: self.daily_limit,
            multipliers: self.multipliers,
            visual_capacity_multiplier: self.settings.visual_capacity_multiplier,
            min_visual_capacity_grams: self.settings.min_visual_capacity_grams,
        }
    }

    pub fn visual_fill_fraction(&self) -> f64 {
        self.gauge().fill_fraction(self.total_grams)
    }

    pub fn limit_progress(&self) -> f64 {
        self.gauge().limit_progress(self.total_grams)
    }

    pub fn recommended_fraction(&self) -> f64 {
        self.gauge().recommended_fraction()
    }

    pub fn threshold_markers(&self) -> Vec<ThresholdMarker> {
        self.gauge().threshold_markers()
    }

    pub fn liquid_palette(&self) -> LiquidPalette {
        self.current_level().liquid_palette()
    }

    /// Quick-access items: featured ranking, then all custom items
    pub fn displayed_items(&self) -> Vec<&SugarItem> {
        self.featured.displayed(&self.catalog)
    }

    /// Built-in items followed by custom items
    pub fn full_catalog(&self) -> Vec<&SugarItem> {
        self.catalog.all().collect()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn featured_names(&self) -> &[String] {
        self.featured.names()
    }

    pub fn pending_level_message(&self) -> Option<&LevelMessage> {
        self.pending_message.as_ref()
    }

    /// Hand the pending level-up message to the caller, clearing it
    pub fn take_level_message(&mut self) -> Option<LevelMessage> {
        self.pending_message.take()
    }

    /// Drain write failures recorded since the last call
    pub fn take_warnings(&mut self) -> Vec<StoreWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn reset_timer_state(&self) -> ResetTimerState {
        self.timer
    }

    /// Persisted per-day history
    pub fn history(&self) -> LogHistory {
        self.store.daily_logs()
    }

    pub fn current_streak(&self, now: DateTime<Local>) -> u32 {
        history::current_streak(&self.history(), now.date_naive())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut T {
        &mut self.scheduler
    }

    // ========================================================================
    // Logging and reset
    // ========================================================================

    /// Log an item found by case-insensitive name
    pub fn log_by_name(
        &mut self,
        name: &str,
        serving: Serving,
        now: DateTime<Local>,
    ) -> Option<LogOutcome> {
        let item = self.catalog.find(name)?.clone();
        Some(self.log_item(&item, serving, now))
    }

    /// Add one serving of an item to today's total
    ///
    /// Non-positive gram amounts add nothing but still count as a log.
    pub fn log_item(&mut self, item: &SugarItem, serving: Serving, now: DateTime<Local>) -> LogOutcome {
        let reset_before_logging = self.ensure_daily_reset(now);

        let grams_added = item.grams_for(serving).max(0);
        self.total_grams = self.total_grams.saturating_add(grams_added);
        self.log_count = self.log_count.saturating_add(1);

        if !item.is_custom {
            self.promote_featured(item);
        }

        self.persist_log_day();

        let level = self.current_level();
        let level_message = self.notify_level_if_needed(level);

        tracing::info!(
            "Logged {} ({}g): total {}g over {} logs, {:?}",
            item.name,
            grams_added,
            self.total_grams,
            self.log_count,
            level
        );

        LogOutcome {
            item_name: item.name.clone(),
            grams_added,
            total_grams: self.total_grams,
            log_count: self.log_count,
            level,
            level_message,
            reset_before_logging,
        }
    }

    /// Zero today's total and announcements
    ///
    /// History for other days, custom items, and the featured ranking are kept.
    pub fn reset_daily(&mut self, now: DateTime<Local>) {
        self.total_grams = 0;
        self.log_count = 0;
        self.last_notified_level = SugarLevel::L1;
        self.log_day = self.log_day.max(now.date_naive());
        self.persist_log_day();
        tracing::info!("Reset daily total for {}", self.log_day);
    }

    /// Reset once if `now` is on a later calendar day than the last reset
    ///
    /// The first call ever only records `now`. A clock that moved backwards
    /// to an earlier day never triggers a reset. Returns whether a reset ran.
    pub fn ensure_daily_reset(&mut self, now: DateTime<Local>) -> bool {
        let today = now.date_naive();
        match self.store.last_reset_date() {
            None => {
                tracing::debug!("No reset bookkeeping yet; recording {}", today);
                self.record_last_reset(now);
                false
            }
            Some(last) if today > last.date_naive() => {
                tracing::info!("Day changed since {}; resetting", last.date_naive());
                self.reset_daily(now);
                self.record_last_reset(now);
                true
            }
            Some(last) if today < last.date_naive() => {
                tracing::warn!(
                    "Clock is before last reset ({} < {}); not resetting",
                    today,
                    last.date_naive()
                );
                false
            }
            Some(_) => false,
        }
    }

    /// Arm the one-shot timer for the next local midnight after `now`
    ///
    /// Any previously armed timer is cancelled first.
    pub fn schedule_next_midnight_reset(&mut self, now: DateTime<Local>) -> DateTime<Local> {
        self.cancel_reset_timer();
        let at = next_midnight_after(&now);
        let handle = self.scheduler.schedule_at(at);
        self.timer = ResetTimerState::Scheduled { handle, at };
        tracing::debug!("Scheduled midnight reset {:?} at {}", handle, at);
        at
    }

    /// Deliver a timer fire; stale or unknown handles are ignored
    pub fn handle_reset_timer(&mut self, handle: TimerHandle, now: DateTime<Local>) -> bool {
        match self.timer {
            ResetTimerState::Scheduled { handle: armed, .. } if armed == handle => {
                self.timer = ResetTimerState::Idle;
                self.reset_daily(now);
                self.record_last_reset(now);
                self.schedule_next_midnight_reset(now);
                true
            }
            _ => {
                tracing::debug!("Ignoring stale reset timer {:?}", handle);
                false
            }
        }
    }

    pub fn cancel_reset_timer(&mut self) {
        if let ResetTimerState::Scheduled { handle, .. } = self.timer {
            self.scheduler.cancel(handle);
            self.timer = ResetTimerState::Idle;
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Change the daily limit (clamped to at least 1)
    ///
    /// Logged grams and announcements are left as they are.
    pub fn update_daily_limit(&mut self, new_limit: i32) {
        self.daily_limit = new_limit.max(1);
        let result = self.store.set_daily_limit(self.daily_limit);
        self.record(keys::DAILY_LIMIT, result);
        tracing::info!("Daily limit set to {}g", self.daily_limit);
    }

    /// Store normalized multipliers and silently catch the announced level up
    pub fn update_threshold_multipliers(&mut self, multipliers: ThresholdMultipliers) {
        self.multipliers = multipliers.normalized();
        let result = self.store.set_threshold_multipliers(self.multipliers);
        self.record(keys::THRESHOLD_L2, result);
        self.last_notified_level = self.current_level();
        tracing::info!(
            "Threshold multipliers set to {:?}; level now {:?}",
            self.multipliers,
            self.last_notified_level
        );
    }

    // ========================================================================
    // Catalog management
    // ========================================================================

    /// Add a custom item; returns false for empty/duplicate names or grams <= 0
    pub fn add_custom_item(&mut self, name: &str, grams: i32, category: SugarItemCategory) -> bool {
        match self.catalog.try_add_custom(name, grams, category) {
            Ok(item) => tracing::info!("Added custom item '{}' ({}g)", item.name, item.sugar_grams),
            Err(reason) => {
                tracing::debug!("Rejected custom item '{}': {:?}", name, reason);
                return false;
            }
        }
        self.catalog_changed();
        true
    }

    /// Remove a custom item by name; returns false when no custom item matches
    pub fn remove_custom_item(&mut self, name: &str) -> bool {
        match self.catalog.remove_custom(name) {
            Some(item) => tracing::info!("Removed custom item '{}'", item.name),
            None => return false,
        }
        self.catalog_changed();
        true
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn notify_level_if_needed(&mut self, level: SugarLevel) -> Option<LevelMessage> {
        if level <= self.last_notified_level {
            return None;
        }
        self.last_notified_level = level;
        let message = level.message(self.daily_limit, self.multipliers)?;
        self.pending_message = Some(message.clone());
        Some(message)
    }

    fn promote_featured(&mut self, item: &SugarItem) {
        let is_builtin = self
            .catalog
            .builtin()
            .iter()
            .any(|b| b.storage_key() == item.storage_key());
        if !is_builtin {
            return;
        }
        self.featured.promote(item.storage_key());
        self.persist_featured();
    }

    fn catalog_changed(&mut self) {
        let records = self.catalog.custom_records();
        let result = self.store.set_custom_items(&records);
        self.record(keys::CUSTOM_ITEMS, result);

        let before = self.featured.clone();
        self.featured.heal(&self.catalog);
        if self.featured != before {
            self.persist_featured();
        }
    }

    fn persist_log_day(&mut self) {
        let log = DailySugarLog {
            grams: self.total_grams,
            count: self.log_count,
        };
        let result = self.store.save_daily_log(&date_key(self.log_day), log);
        self.record(keys::DAILY_LOGS, result);
    }

    fn persist_featured(&mut self) {
        let result = self.store.set_recent_items(self.featured.names());
        self.record(keys::RECENT_ITEMS, result);
    }

    fn record_last_reset(&mut self, now: DateTime<Local>) {
        let result = self.store.set_last_reset_date(start_of_day(&now));
        self.record(keys::LAST_RESET_DATE, result);
    }

    fn record(&mut self, key: &str, result: Result<()>) {
        if let Err(e) = result {
            tracing::warn!("Failed to persist '{}': {}", key, e);
            self.warnings.push(StoreWarning {
                key: key.to_string(),
                message: e.to_string(),
            });
        }
    }
}

impl<S: KeyValueStore, T: Scheduler> Drop for SugarTracker<S, T> {
    fn drop(&mut self) {
        self.cancel_reset_timer();
    }
}
