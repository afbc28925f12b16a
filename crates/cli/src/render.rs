//! Plain-text output.

use chrono::{Datelike, NaiveDate};
use taskdeck_analytics::{CalendarMonth, DashboardStats, KanbanBoard, ProductivityReport};
use taskdeck_core::{format_duration, Comment, Notification, Task, TaskStatus, TimeEntry, UserId};
use taskdeck_workflow::Gate;

pub fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::NotStarted => "TODO",
        TaskStatus::InProgress => "DOING",
        TaskStatus::Review => "REVIEW",
        TaskStatus::Completed => "DONE",
    }
}

pub fn task_line(task: &Task, today: NaiveDate) -> String {
    let due = match task.due_date {
        Some(d) if task.is_overdue(today) => format!(" due {} (overdue)", d),
        Some(d) => format!(" due {}", d),
        None => String::new(),
    };
    let blocked = if task.dependencies_met { "" } else { " [blocked]" };
    let repeat = if task.recurrence.is_some() { " [recurring]" } else { "" };
    format!(
        "{} | {:<6} | {:<6} | {}{}{}{}",
        task.id,
        status_label(task.status),
        task.priority,
        task.title,
        due,
        blocked,
        repeat
    )
}

pub fn task_detail(task: &Task, gate: &Gate) {
    println!("Task: {}", task.id);
    println!("  Title: {}", task.title);
    if !task.description.is_empty() {
        println!("  Description: {}", task.description);
    }
    println!("  Status: {}", task.status);
    println!("  Priority: {}", task.priority);
    if let Some(due) = task.due_date {
        println!("  Due: {}", due);
    }
    println!("  Owner: {}", task.owner);
    if !task.assigned_to.is_empty() {
        println!("  Assigned: {}", join(task.assigned_to.iter()));
    }
    if !task.tags.is_empty() {
        println!("  Tags: {}", join(task.tags.iter()));
    }
    if let Some(team) = task.team_id {
        println!("  Team: {}", team);
    }
    if let Some(rule) = &task.recurrence {
        let mut line = format!("every {} {}", rule.interval, rule.frequency);
        if let Some(count) = rule.count {
            line.push_str(&format!(", {} times", count));
        }
        if let Some(until) = rule.until {
            line.push_str(&format!(", until {}", until));
        }
        println!("  Repeats: {} (occurrence {})", line, task.occurrence);
    }
    if !task.dependencies.is_empty() {
        println!("  Depends on: {}", join(task.dependencies.iter()));
        match gate {
            Gate::Ready => println!("  Dependencies: all complete"),
            Gate::Blocked(pending) => println!("  Waiting on: {}", join(pending.iter())),
        }
    }
    for a in &task.attachments {
        println!("  Attachment: {} ({} bytes) -> {}", a.name, a.size, a.location);
    }
    println!("  Tracked: {}", format_duration(task.total_tracked_secs));
    println!("  Created: {}", task.created_at);
    if let Some(done) = task.completed_at {
        println!("  Completed: {}", done);
    }
}

pub fn entry_line(entry: &TimeEntry, now: chrono::DateTime<chrono::Utc>) -> String {
    let state = if entry.active { " (running)" } else { "" };
    format!(
        "{} | {} | {} | {}{}",
        entry.id,
        entry.task_id,
        entry.start_time.format("%Y-%m-%d %H:%M"),
        format_duration(entry.elapsed_secs(now)),
        state
    )
}

pub fn comment_line(comment: &Comment) -> String {
    let edited = if comment.edited_at.is_some() { " (edited)" } else { "" };
    format!(
        "{} | {} | {}{}\n    {}",
        comment.id,
        comment.author,
        comment.created_at.format("%Y-%m-%d %H:%M"),
        edited,
        comment.body
    )
}

pub fn notification_line(n: &Notification, user: &UserId) -> String {
    let marker = if n.is_unread_by(user) { "*" } else { " " };
    format!(
        "{} {} | {} | {}",
        marker,
        n.id,
        n.created_at.format("%Y-%m-%d %H:%M"),
        n.message
    )
}

pub fn board(board: &KanbanBoard) {
    for column in &board.columns {
        println!("== {} ({}) ==", status_label(column.status), column.tasks.len());
        for task in &column.tasks {
            let due = task.due_date.map(|d| format!(" ({})", d)).unwrap_or_default();
            println!("  [{}] {}{}", task.priority, task.title, due);
        }
    }
}

pub fn calendar(cal: &CalendarMonth) {
    println!("{}-{:02}", cal.year, cal.month);
    println!(" Mo  Tu  We  Th  Fr  Sa  Su");
    for week in cal.weeks() {
        let row: Vec<String> = week
            .iter()
            .map(|cell| match cell {
                Some(d) if !cal.tasks_on(*d).is_empty() => format!("{:>3}*", d.day()),
                Some(d) => format!("{:>3} ", d.day()),
                None => "    ".to_string(),
            })
            .collect();
        println!("{}", row.join(""));
    }
    for (date, tasks) in &cal.days {
        println!("{}:", date);
        for task in tasks {
            println!("  [{}] {} {}", status_label(task.status), task.title, task.id);
        }
    }
}

pub fn stats(stats: &DashboardStats) {
    println!("Tasks: {}", stats.total);
    for (status, count) in &stats.by_status {
        println!("  {}: {}", status_label(*status), count);
    }
    for (priority, count) in &stats.by_priority {
        println!("  {} priority: {}", priority, count);
    }
    println!("Overdue: {}", stats.overdue);
    println!("Due today: {}", stats.due_today);
    println!("Due this week: {}", stats.due_this_week);
    println!("Completion rate: {:.0}%", stats.completion_rate * 100.0);
    println!("Tracked: {}", format_duration(stats.tracked_secs));
}

pub fn productivity(report: &ProductivityReport) {
    println!("{} .. {}", report.from, report.to);
    for (day, count) in &report.completed_per_day {
        println!("  {} {:>3} {}", day, count, "#".repeat(*count));
    }
    println!("Completed: {} ({:.1}/day)", report.total_completed(), report.average_per_day());
    for (user, secs) in &report.tracked_per_user {
        println!("  {}: {}", user, format_duration(*secs));
    }
}

fn join<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}
