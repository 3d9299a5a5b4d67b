#![forbid(unsafe_code)]

//! Core domain model and business logic for SugarMeter.
//!
//! This crate provides:
//! - Domain types (items, servings, daily logs, threshold multipliers)
//! - Severity levels and liquid-gauge math
//! - Item catalog and featured-item ranking
//! - The daily tracking engine with its midnight reset
//! - Persistence (key-value store port, JSON file store, legacy migration)
//! - Read-only widget snapshots

pub mod types;
pub mod error;
pub mod level;
pub mod gauge;
pub mod calendar;
pub mod scheduler;
pub mod store;
pub mod history;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod unit;
pub mod engine;
pub mod widget;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use level::{LevelMessage, LiquidPalette, Rgba, SugarLevel, SugarThreshold, SugarZone};
pub use gauge::{GaugeSpec, ThresholdMarker};
pub use scheduler::{ManualScheduler, Scheduler, TimerHandle};
pub use store::{
    migrate_legacy, JsonFileStore, KeyValueStore, LogHistory, MemoryStore, StoreWarning,
    SugarStoreExt,
};
pub use catalog::{builtin_items, Catalog, CustomItemRejection, FeaturedItems};
pub use config::Config;
pub use unit::SugarUnit;
pub use engine::{LogOutcome, ResetTimerState, SugarTracker, TrackerSettings};
pub use widget::WidgetSnapshot;
