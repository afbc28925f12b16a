//! Time entry model - a start/stop interval of work against a task.

use serde::{Deserialize, Serialize};
use crate::id::{TaskId, TimeEntryId};
use crate::user::UserId;
use crate::Time;

/// A recorded interval of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Unique identifier
    pub id: TimeEntryId,

    /// Task the time was spent on
    pub task_id: TaskId,

    /// Who spent it
    pub user_id: UserId,

    /// When tracking started
    pub start_time: Time,

    /// When tracking stopped; `None` while active
    pub end_time: Option<Time>,

    /// Whole seconds between start and end
    pub duration_secs: u64,

    /// Whether the clock is still running
    pub active: bool,
}

impl TimeEntry {
    /// Start an active entry at `now`.
    pub fn start(task_id: TaskId, user_id: UserId, now: Time) -> Self {
        Self {
            id: TimeEntryId::new(),
            task_id,
            user_id,
            start_time: now,
            end_time: None,
            duration_secs: 0,
            active: true,
        }
    }

    /// Close the entry at `now`. A clock that went backwards yields zero.
    pub fn stop(&mut self, now: Time) {
        self.end_time = Some(now);
        self.duration_secs = u64::try_from((now - self.start_time).num_seconds()).unwrap_or(0);
        self.active = false;
    }

    /// Seconds elapsed so far, counting a running entry up to `now`.
    pub fn elapsed_secs(&self, now: Time) -> u64 {
        if self.active {
            u64::try_from((now - self.start_time).num_seconds()).unwrap_or(0)
        } else {
            self.duration_secs
        }
    }
}

/// Render seconds as `HH:MM:SS`. Hours are not capped at 99.
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(3661), "01:01:01");
        assert_eq!(format_duration(59), "00:00:59");
        assert_eq!(format_duration(100 * 3600), "100:00:00");
    }

    #[test]
    fn test_stop_computes_whole_seconds() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut entry = TimeEntry::start(TaskId::new(), UserId::new("a"), start);
        entry.stop(start + Duration::milliseconds(90_900));
        assert_eq!(entry.duration_secs, 90);
        assert!(!entry.active);
        assert!(entry.end_time.is_some());
    }

    #[test]
    fn test_backwards_clock_yields_zero() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let mut entry = TimeEntry::start(TaskId::new(), UserId::new("a"), start);
        entry.stop(start - Duration::seconds(5));
        assert_eq!(entry.duration_secs, 0);
    }
}
