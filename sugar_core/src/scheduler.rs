//! Scheduler port for the one-shot midnight reset timer.
//!
//! The engine only arms and cancels timers. The host owns the actual clock
//! and reports a fire back through `SugarTracker::handle_reset_timer`.

use chrono::{DateTime, Local};
use std::collections::BTreeMap;

/// Opaque identity of an armed timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(pub u64);

/// Capability to arm and cancel one-shot wall-clock timers
pub trait Scheduler {
    /// Arm a timer that fires once at `at`
    fn schedule_at(&mut self, at: DateTime<Local>) -> TimerHandle;

    /// Cancel an armed timer; unknown handles are ignored
    fn cancel(&mut self, handle: TimerHandle);
}

/// Scheduler that records timers and lets the caller decide when they fire
///
/// Used by tests and by hosts that poll instead of running an event loop.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    armed: BTreeMap<TimerHandle, DateTime<Local>>,
    cancelled: Vec<TimerHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently armed timers, ordered by arming sequence
    pub fn armed(&self) -> Vec<(TimerHandle, DateTime<Local>)> {
        self.armed.iter().map(|(h, at)| (*h, *at)).collect()
    }

    /// Handles cancelled so far
    pub fn cancelled(&self) -> &[TimerHandle] {
        &self.cancelled
    }

    /// Remove and return every timer due at or before `now`
    pub fn take_due(&mut self, now: DateTime<Local>) -> Vec<TimerHandle> {
        let due: Vec<TimerHandle> = self
            .armed
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(h, _)| *h)
            .collect();
        for handle in &due {
            self.armed.remove(handle);
        }
        due
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_at(&mut self, at: DateTime<Local>) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.armed.insert(handle, at);
        tracing::debug!("Armed timer {:?} for {}", handle, at);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if self.armed.remove(&handle).is_some() {
            tracing::debug!("Cancelled timer {:?}", handle);
            self.cancelled.push(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_take_due_only_returns_elapsed() {
        let now = Local.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).earliest().unwrap();
        let mut scheduler = ManualScheduler::new();
        let soon = scheduler.schedule_at(now + Duration::hours(1));
        let later = scheduler.schedule_at(now + Duration::hours(5));

        assert!(scheduler.take_due(now).is_empty());
        assert_eq!(scheduler.take_due(now + Duration::hours(2)), vec![soon]);
        assert_eq!(scheduler.armed().len(), 1);
        assert_eq!(scheduler.armed()[0].0, later);
    }

    #[test]
    fn test_cancel_is_recorded_once() {
        let now = Local.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).earliest().unwrap();
        let mut scheduler = ManualScheduler::new();
        let handle = scheduler.schedule_at(now);

        scheduler.cancel(handle);
        scheduler.cancel(handle);

        assert!(scheduler.armed().is_empty());
        assert_eq!(scheduler.cancelled(), &[handle]);
    }
}
