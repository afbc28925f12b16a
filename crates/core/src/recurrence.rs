//! Recurrence rules and next-due-date arithmetic.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// How often a recurring task comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every `interval` days
    Daily,
    /// Every `interval` weeks
    Weekly,
    /// Every `interval` months
    Monthly,
    /// Every `interval` years
    Yearly,
}

impl Frequency {
    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Frequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Frequency::Daily),
            "weekly" | "week" => Ok(Frequency::Weekly),
            "monthly" | "month" => Ok(Frequency::Monthly),
            "yearly" | "year" | "annually" => Ok(Frequency::Yearly),
            _ => Err(CoreError::UnknownVariant {
                kind: "frequency",
                value: s.to_string(),
            }),
        }
    }
}

/// Policy for regenerating a task after completion.
///
/// `count` and `until` may both be set; the series ends at whichever limit
/// is reached first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    /// Unit of repetition
    pub frequency: Frequency,

    /// Number of units between occurrences (>= 1)
    pub interval: u32,

    /// Maximum number of occurrences in the series
    #[serde(default)]
    pub count: Option<u32>,

    /// Last date an occurrence may fall on
    #[serde(default)]
    pub until: Option<NaiveDate>,
}

impl RecurrenceRule {
    /// Create an unbounded rule.
    pub fn new(frequency: Frequency, interval: u32) -> Result<Self> {
        let rule = Self {
            frequency,
            interval,
            count: None,
            until: None,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Stop after `count` occurrences.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Stop after `until`.
    pub fn with_until(mut self, until: NaiveDate) -> Self {
        self.until = Some(until);
        self
    }

    /// Reject zero intervals and zero counts.
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(CoreError::InvalidInterval(self.interval));
        }
        if self.count == Some(0) {
            return Err(CoreError::InvalidCount);
        }
        Ok(())
    }

    /// Add one step of the rule to `from`.
    ///
    /// Month and year steps clamp to the last day of the target month, so
    /// Jan 31 plus one month is Feb 28 (or 29). Returns `None` only if the
    /// result leaves chrono's supported range.
    pub fn step(&self, from: NaiveDate) -> Option<NaiveDate> {
        let n = self.interval.max(1);
        match self.frequency {
            Frequency::Daily => from.checked_add_days(Days::new(u64::from(n))),
            Frequency::Weekly => from.checked_add_days(Days::new(u64::from(n) * 7)),
            Frequency::Monthly => from.checked_add_months(Months::new(n)),
            Frequency::Yearly => from.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }

    /// Due date of the occurrence after `occurrence` (1-based), which was due
    /// on `due`. `None` when the series is over.
    pub fn next_due_date(&self, due: NaiveDate, occurrence: u32) -> Option<NaiveDate> {
        if self.count.is_some_and(|count| occurrence >= count) {
            return None;
        }
        let next = self.step(due)?;
        if self.until.is_some_and(|until| next > until) {
            return None;
        }
        Some(next)
    }
}
