//! Core domain types for the SugarMeter system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Loggable items and their categories
//! - Serving sizes and explicit gram overrides
//! - Persisted daily log records
//! - Severity threshold multipliers

use serde::{Deserialize, Serialize};

// ============================================================================
// Item Types
// ============================================================================

/// Category of a loggable treat
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SugarItemCategory {
    Bakery,
    Drink,
    Candy,
    Dessert,
    Breakfast,
    Condiment,
    Snack,
    Fastfood,
    Kids,
    Custom,
    #[default]
    Other,
}

impl SugarItemCategory {
    pub const ALL: [SugarItemCategory; 11] = [
        SugarItemCategory::Bakery,
        SugarItemCategory::Drink,
        SugarItemCategory::Candy,
        SugarItemCategory::Dessert,
        SugarItemCategory::Breakfast,
        SugarItemCategory::Condiment,
        SugarItemCategory::Snack,
        SugarItemCategory::Fastfood,
        SugarItemCategory::Kids,
        SugarItemCategory::Custom,
        SugarItemCategory::Other,
    ];

    /// Human-readable title
    pub fn title(self) -> &'static str {
        match self {
            SugarItemCategory::Bakery => "Bakery",
            SugarItemCategory::Drink => "Drink",
            SugarItemCategory::Candy => "Candy",
            SugarItemCategory::Dessert => "Dessert",
            SugarItemCategory::Breakfast => "Breakfast",
            SugarItemCategory::Condiment => "Condiment",
            SugarItemCategory::Snack => "Snack",
            SugarItemCategory::Fastfood => "Fast Food",
            SugarItemCategory::Kids => "Kids",
            SugarItemCategory::Custom => "Custom",
            SugarItemCategory::Other => "Other",
        }
    }

    /// Parse a category name, accepting the snake_case id or the title
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_lowercase().replace([' ', '_', '-'], "");
        Self::ALL
            .into_iter()
            .find(|c| c.title().to_lowercase().replace(' ', "") == needle)
    }
}

/// A loggable treat
///
/// `name` doubles as the stable storage key.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SugarItem {
    pub name: String,
    pub sugar_grams: i32,
    pub image_name: Option<String>,
    pub is_custom: bool,
    pub category: SugarItemCategory,
}

impl SugarItem {
    /// Create a built-in item
    pub fn builtin(
        name: &str,
        sugar_grams: i32,
        image_name: &str,
        category: SugarItemCategory,
    ) -> Self {
        Self {
            name: name.into(),
            sugar_grams,
            image_name: Some(image_name.into()),
            is_custom: false,
            category,
        }
    }

    /// Create a user-defined item
    pub fn custom(name: &str, sugar_grams: i32, category: SugarItemCategory) -> Self {
        Self {
            name: name.into(),
            sugar_grams,
            image_name: None,
            is_custom: true,
            category,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.name
    }

    /// Case-insensitive identity used for uniqueness checks
    pub fn identity(&self) -> String {
        self.name.to_lowercase()
    }

    /// Grams this item contributes for the given serving
    ///
    /// Size multipliers round half away from zero (`f64::round`).
    pub fn grams_for(&self, serving: Serving) -> i32 {
        match serving {
            Serving::Size(size) => (self.sugar_grams as f64 * size.multiplier()).round() as i32,
            Serving::Grams(grams) => grams,
        }
    }
}

/// Persisted form of a custom item
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomItemRecord {
    pub name: String,
    pub grams: i32,
    #[serde(default)]
    pub category: SugarItemCategory,
}

impl From<&SugarItem> for CustomItemRecord {
    fn from(item: &SugarItem) -> Self {
        Self {
            name: item.name.clone(),
            grams: item.sugar_grams,
            category: item.category,
        }
    }
}

impl From<CustomItemRecord> for SugarItem {
    fn from(record: CustomItemRecord) -> Self {
        SugarItem::custom(&record.name, record.grams, record.category)
    }
}

// ============================================================================
// Serving Types
// ============================================================================

/// Portion size applied to an item's base grams
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SugarItemSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl SugarItemSize {
    pub fn multiplier(self) -> f64 {
        match self {
            SugarItemSize::Small => 0.75,
            SugarItemSize::Medium => 1.0,
            SugarItemSize::Large => 1.25,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SugarItemSize::Small => "Small",
            SugarItemSize::Medium => "Medium",
            SugarItemSize::Large => "Large",
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            SugarItemSize::Small => "S",
            SugarItemSize::Medium => "M",
            SugarItemSize::Large => "L",
        }
    }
}

/// How much of an item was consumed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Serving {
    /// Base grams scaled by a size multiplier
    Size(SugarItemSize),
    /// Explicit gram value, bypassing size multipliers
    Grams(i32),
}

impl Default for Serving {
    fn default() -> Self {
        Serving::Size(SugarItemSize::Medium)
    }
}

impl From<SugarItemSize> for Serving {
    fn from(size: SugarItemSize) -> Self {
        Serving::Size(size)
    }
}

// ============================================================================
// Log and Threshold Types
// ============================================================================

/// Persisted per-day log record
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DailySugarLog {
    pub grams: i32,
    pub count: i32,
}

/// Severity threshold multipliers applied to the daily limit
///
/// Each multiplier yields the upper gram boundary of the level below it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ThresholdMultipliers {
    pub l2: f64,
    pub l3: f64,
    pub l4: f64,
    pub l5: f64,
}

impl ThresholdMultipliers {
    pub const DEFAULT: ThresholdMultipliers = ThresholdMultipliers {
        l2: 1.0,
        l3: 2.0,
        l4: 4.0,
        l5: 5.0,
    };

    pub fn new(l2: f64, l3: f64, l4: f64, l5: f64) -> Self {
        Self { l2, l3, l4, l5 }
    }

    /// Force `1 <= l2 <= l3 <= l4 <= l5`
    pub fn normalized(self) -> Self {
        let l2 = self.l2.max(1.0);
        let l3 = self.l3.max(l2);
        let l4 = self.l4.max(l3);
        let l5 = self.l5.max(l4);
        Self { l2, l3, l4, l5 }
    }

    pub fn as_array(self) -> [f64; 4] {
        [self.l2, self.l3, self.l4, self.l5]
    }
}

impl Default for ThresholdMultipliers {
    fn default() -> Self {
        Self::DEFAULT
    }
}
