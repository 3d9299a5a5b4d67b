//! Per-day log history and logging streaks.
//!
//! History is a map from local `yyyy-MM-dd` keys to the day's totals. Entries
//! are overwritten for "today" and never deleted.

use crate::store::LogHistory;
use crate::DailySugarLog;
use chrono::{DateTime, Local, NaiveDate};
use std::collections::BTreeSet;

/// Storage key format for a calendar day
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Minimum grams for a day to count as logged on the calendar
pub const DEFAULT_MIN_LOGGED_GRAMS: i32 = 1;

/// `yyyy-MM-dd` key of a local calendar date
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// `yyyy-MM-dd` key of the local day containing `at`
pub fn date_key_at(at: &DateTime<Local>) -> String {
    date_key(at.date_naive())
}

/// Stored log for a day, or a zeroed log when the day has no entry
pub fn log_for(history: &LogHistory, date: NaiveDate) -> DailySugarLog {
    history.get(&date_key(date)).copied().unwrap_or_default()
}

/// Keys of days with at least `min_grams` logged
pub fn logged_date_keys(history: &LogHistory, min_grams: i32) -> BTreeSet<String> {
    history
        .iter()
        .filter(|(_, log)| log.grams >= min_grams)
        .map(|(key, _)| key.clone())
        .collect()
}

/// Consecutive logged days ending today, or ending yesterday if today is empty
pub fn current_streak(history: &LogHistory, today: NaiveDate) -> u32 {
    let logged = logged_date_keys(history, DEFAULT_MIN_LOGGED_GRAMS);
    let is_logged = |day: NaiveDate| logged.contains(&date_key(day));

    let start = if is_logged(today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if is_logged(yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut count = 0;
    let mut cursor = Some(start);
    while let Some(day) = cursor.filter(|d| is_logged(*d)) {
        count += 1;
        cursor = day.pred_opt();
    }

    tracing::debug!("Current streak as of {}: {} days", today, count);
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history(entries: &[(&str, i32)]) -> LogHistory {
        entries
            .iter()
            .map(|(key, grams)| {
                (
                    key.to_string(),
                    DailySugarLog {
                        grams: *grams,
                        count: 1,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_date_key_format() {
        assert_eq!(date_key(day(2026, 3, 7)), "2026-03-07");
        assert_eq!(date_key(day(1999, 12, 31)), "1999-12-31");
    }

    #[test]
    fn test_log_for_missing_day_is_zero() {
        let h = history(&[("2026-03-07", 40)]);
        assert_eq!(log_for(&h, day(2026, 3, 7)).grams, 40);
        assert_eq!(log_for(&h, day(2026, 3, 8)), DailySugarLog::default());
    }

    #[test]
    fn test_logged_date_keys_threshold() {
        let h = history(&[("2026-03-05", 0), ("2026-03-06", 1), ("2026-03-07", 30)]);
        let keys = logged_date_keys(&h, 1);
        assert_eq!(keys.len(), 2);
        assert!(!keys.contains("2026-03-05"));
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        let h = history(&[
            ("2026-03-04", 10),
            ("2026-03-06", 10),
            ("2026-03-07", 10),
            ("2026-03-08", 10),
        ]);
        assert_eq!(current_streak(&h, day(2026, 3, 8)), 3);
    }

    #[test]
    fn test_streak_starts_yesterday_when_today_empty() {
        let h = history(&[("2026-03-06", 10), ("2026-03-07", 10), ("2026-03-08", 0)]);
        assert_eq!(current_streak(&h, day(2026, 3, 8)), 2);
    }

    #[test]
    fn test_streak_broken() {
        let h = history(&[("2026-03-05", 10)]);
        assert_eq!(current_streak(&h, day(2026, 3, 8)), 0);
        assert_eq!(current_streak(&LogHistory::new(), day(2026, 3, 8)), 0);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let h = history(&[("2026-02-27", 5), ("2026-02-28", 5), ("2026-03-01", 5)]);
        assert_eq!(current_streak(&h, day(2026, 3, 1)), 3);
    }
}
