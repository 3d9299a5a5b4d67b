//! Local-calendar helpers for day-boundary bookkeeping.
//!
//! All comparisons are by calendar day in the local timezone, never by
//! elapsed time.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveTime, TimeZone};

/// True when both instants fall on the same local calendar day
pub fn same_day(a: &DateTime<Local>, b: &DateTime<Local>) -> bool {
    a.date_naive() == b.date_naive()
}

/// First valid instant of the local calendar day
pub fn start_of_day(at: &DateTime<Local>) -> DateTime<Local> {
    first_instant_of(at.date_naive()).unwrap_or(*at)
}

/// Next local midnight strictly after `now`
///
/// On days where midnight is skipped by a DST transition this is the first
/// instant that exists on the following day.
pub fn next_midnight_after(now: &DateTime<Local>) -> DateTime<Local> {
    let mut day = now.date_naive();
    loop {
        day = match day.succ_opt() {
            Some(next) => next,
            None => return *now + Duration::days(1),
        };
        if let Some(at) = first_instant_of(day) {
            if at > *now {
                return at;
            }
        }
    }
}

/// First instant of a local date, probing forward when midnight does not exist
pub(crate) fn first_instant_of(day: NaiveDate) -> Option<DateTime<Local>> {
    (0..24).find_map(|hour| {
        let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
        match Local.from_local_datetime(&day.and_time(time)) {
            LocalResult::Single(at) => Some(at),
            LocalResult::Ambiguous(earliest, _) => Some(earliest),
            LocalResult::None => None,
        }
    })
}
