//! Month calendar of due dates.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use taskdeck_core::Task;

/// Tasks grouped by due date within one month.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    /// Year
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
    /// Tasks per due date; only days with tasks are present
    pub days: BTreeMap<NaiveDate, Vec<Task>>,
}

impl CalendarMonth {
    /// Group `tasks` due in `year`/`month`. `None` for an invalid month.
    pub fn build(year: i32, month: u32, tasks: impl IntoIterator<Item = Task>) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)?;
        let mut days: BTreeMap<NaiveDate, Vec<Task>> = BTreeMap::new();
        for task in tasks {
            let Some(due) = task.due_date else { continue };
            if due.year() == year && due.month() == month {
                days.entry(due).or_default().push(task);
            }
        }
        for list in days.values_mut() {
            list.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.title.cmp(&b.title)));
        }
        Some(Self { year, month, days })
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Number of days in the month.
    pub fn days_in_month(&self) -> u32 {
        let first = self.first_day();
        first
            .checked_add_months(Months::new(1))
            .map(|next| (next - first).num_days() as u32)
            .unwrap_or(31)
    }

    /// Tasks due on `date`.
    pub fn tasks_on(&self, date: NaiveDate) -> &[Task] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or_default()
    }

    /// Monday-first week rows; cells outside the month are `None`.
    pub fn weeks(&self) -> Vec<[Option<NaiveDate>; 7]> {
        let first = self.first_day();
        let offset = first.weekday().num_days_from_monday() as usize;
        let mut weeks = Vec::new();
        let mut row = [None; 7];
        let mut col = offset;
        for day in first.iter_days().take(self.days_in_month() as usize) {
            row[col] = Some(day);
            col += 1;
            if col == 7 {
                weeks.push(row);
                row = [None; 7];
                col = 0;
            }
        }
        if col > 0 {
            weeks.push(row);
        }
        weeks
    }
}
