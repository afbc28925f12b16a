//! Dashboard statistics, productivity reports, and board/calendar views.

#![warn(missing_docs)]

pub mod board;
pub mod calendar;
pub mod productivity;
pub mod reporter;
pub mod stats;

pub use board::{Column, KanbanBoard};
pub use calendar::CalendarMonth;
pub use productivity::ProductivityReport;
pub use reporter::{Reporter, StorageReporter};
pub use stats::DashboardStats;
