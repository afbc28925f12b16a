//! Productivity over a date range.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;
use taskdeck_core::{Task, TimeEntry, UserId};

/// Completions and tracked time between two dates, both inclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductivityReport {
    /// First day
    pub from: NaiveDate,
    /// Last day
    pub to: NaiveDate,
    /// Tasks completed per day; every day in range is present
    pub completed_per_day: BTreeMap<NaiveDate, usize>,
    /// Seconds of finished entries per user, by entry start date
    pub tracked_per_user: BTreeMap<UserId, u64>,
}

impl ProductivityReport {
    /// Build a report, reading timestamps as local dates so days line up
    /// with the `today` callers pass elsewhere. An inverted range yields an
    /// empty report.
    pub fn compute(tasks: &[Task], entries: &[TimeEntry], from: NaiveDate, to: NaiveDate) -> Self {
        Self::compute_in(tasks, entries, from, to, &Local)
    }

    /// [`compute`](Self::compute) with timestamps bucketed by their date in `tz`.
    pub fn compute_in<Tz: TimeZone>(
        tasks: &[Task],
        entries: &[TimeEntry],
        from: NaiveDate,
        to: NaiveDate,
        tz: &Tz,
    ) -> Self {
        let mut completed_per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        if from <= to {
            for day in from.iter_days().take_while(|d| *d <= to) {
                completed_per_day.insert(day, 0);
            }
        }

        for task in tasks {
            let Some(done) = task.completed_at else { continue };
            if let Some(count) = completed_per_day.get_mut(&done.with_timezone(tz).date_naive()) {
                *count += 1;
            }
        }

        let mut tracked_per_user: BTreeMap<UserId, u64> = BTreeMap::new();
        for entry in entries.iter().filter(|e| !e.active) {
            let day = entry.start_time.with_timezone(tz).date_naive();
            if day >= from && day <= to {
                *tracked_per_user.entry(entry.user_id.clone()).or_default() += entry.duration_secs;
            }
        }

        Self {
            from,
            to,
            completed_per_day,
            tracked_per_user,
        }
    }

    /// Total completions in range.
    pub fn total_completed(&self) -> usize {
        self.completed_per_day.values().sum()
    }

    /// Total tracked seconds in range.
    pub fn total_tracked_secs(&self) -> u64 {
        self.tracked_per_user.values().sum()
    }

    /// Mean completions per day.
    pub fn average_per_day(&self) -> f64 {
        if self.completed_per_day.is_empty() {
            return 0.0;
        }
        self.total_completed() as f64 / self.completed_per_day.len() as f64
    }
}
