//! Display units for sugar amounts.

use serde::{Deserialize, Serialize};

pub const GRAMS_PER_OUNCE: f64 = 28.3495;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SugarUnit {
    #[default]
    Grams,
    Ounces,
}

impl SugarUnit {
    pub fn label(self) -> &'static str {
        match self {
            SugarUnit::Grams => "g",
            SugarUnit::Ounces => "oz",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SugarUnit::Grams => "Grams",
            SugarUnit::Ounces => "Ounces",
        }
    }

    pub fn value_from_grams(self, grams: i32) -> f64 {
        match self {
            SugarUnit::Grams => grams as f64,
            SugarUnit::Ounces => grams as f64 / GRAMS_PER_OUNCE,
        }
    }

    /// Convert a value in this unit back to whole grams
    pub fn grams_from(self, value: f64) -> i32 {
        match self {
            SugarUnit::Grams => value.round() as i32,
            SugarUnit::Ounces => (value * GRAMS_PER_OUNCE).round() as i32,
        }
    }

    pub fn formatted_value(self, grams: i32) -> String {
        match self {
            SugarUnit::Grams => grams.to_string(),
            SugarUnit::Ounces => format_ounces(self.value_from_grams(grams)),
        }
    }

    pub fn formatted_with_unit(self, grams: i32) -> String {
        format!("{}{}", self.formatted_value(grams), self.label())
    }
}

/// Two decimals with trailing zeros trimmed: `1.50` -> `1.5`, `2.00` -> `2`
fn format_ounces(value: f64) -> String {
    let mut text = format!("{:.2}", value);
    if text.ends_with("00") {
        text.truncate(text.len() - 3);
    } else if text.ends_with('0') {
        text.truncate(text.len() - 1);
    }
    text
}
