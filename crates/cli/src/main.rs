//! Taskdeck CLI - tasks with recurrence, dependencies and time tracking.

mod config;
mod render;
mod session;

use std::collections::BTreeSet;

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Days, NaiveDate};
use clap::{Parser, Subcommand};
use taskdeck_analytics::{Reporter, StorageReporter};
use taskdeck_core::{
    Attachment, CommentId, Frequency, NotificationId, Priority, RecurrenceRule, Role, TaskFilter,
    TaskId, TaskPatch, TaskStatus, TeamId, TimeEntryId, UserId,
};
use taskdeck_storage::JsonStorage;
use taskdeck_workflow::{
    recurrence::upcoming, shared, CommentService, NewTask, NotificationService, RecurrenceService,
    SharedStorage, TaskManager, TeamService, TimeTracker,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Task management with recurrence, dependencies and time tracking", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as a user
    Login {
        /// User id
        user: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Add a new task
    Add {
        /// Title
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Assign to a user (repeatable)
        #[arg(long = "assign")]
        assignees: Vec<String>,
        /// Prerequisite task (repeatable)
        #[arg(long = "after")]
        dependencies: Vec<TaskId>,
        #[command(flatten)]
        repeat: RepeatArgs,
        /// Share with a team
        #[arg(long)]
        team: Option<TeamId>,
    },
    /// List tasks
    List {
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        team: Option<TeamId>,
        /// Due on or after
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Due on or before
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Text in title or description
        #[arg(long)]
        search: Option<String>,
        /// Only overdue tasks
        #[arg(long)]
        overdue: bool,
    },
    /// Show task details
    Show {
        id: TaskId,
    },
    /// Change task fields
    Update {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "no_due")]
        due: Option<NaiveDate>,
        #[arg(long)]
        no_due: bool,
        /// Replace tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[command(flatten)]
        repeat: RepeatArgs,
        #[arg(long, conflicts_with = "repeat")]
        no_repeat: bool,
        #[arg(long, conflicts_with = "no_team")]
        team: Option<TeamId>,
        #[arg(long)]
        no_team: bool,
    },
    /// Set task status
    Status {
        id: TaskId,
        status: TaskStatus,
    },
    /// Mark a task completed
    Complete {
        id: TaskId,
    },
    /// Assign a user
    Assign {
        id: TaskId,
        user: String,
    },
    /// Remove an assignee
    Unassign {
        id: TaskId,
        user: String,
    },
    /// Add or remove a dependency
    Depend {
        id: TaskId,
        /// Task that must be completed first
        on: TaskId,
        #[arg(long)]
        remove: bool,
    },
    /// Record attachment metadata
    Attach {
        id: TaskId,
        name: String,
        /// Where the file lives
        location: String,
        #[arg(long, default_value_t = 0)]
        size: u64,
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Remove an attachment
    Detach {
        id: TaskId,
        name: String,
    },
    /// Delete a task
    Delete {
        id: TaskId,
    },
    /// Show the instances of a recurring task
    Series {
        id: TaskId,
        /// Upcoming due dates to preview
        #[arg(long, default_value_t = 3)]
        preview: usize,
    },
    /// Time tracking
    Track {
        #[command(subcommand)]
        command: TrackCommand,
    },
    /// Task comments
    Comment {
        #[command(subcommand)]
        command: CommentCommand,
    },
    /// Notifications
    Notifications {
        #[command(subcommand)]
        command: NotificationCommand,
    },
    /// Teams
    Team {
        #[command(subcommand)]
        command: TeamCommand,
    },
    /// Kanban board
    Board {
        #[arg(long)]
        team: Option<TeamId>,
    },
    /// Month calendar of due dates
    Calendar {
        /// Month as YYYY-MM; defaults to the current month
        month: Option<String>,
    },
    /// Dashboard statistics
    Stats,
    /// Productivity over recent days
    Report {
        #[arg(long, default_value_t = 7)]
        days: u64,
    },
}

#[derive(clap::Args)]
struct RepeatArgs {
    /// Repeat daily, weekly, monthly or yearly
    #[arg(long)]
    repeat: Option<Frequency>,
    /// Repeat every N periods
    #[arg(long, default_value_t = 1, requires = "repeat")]
    every: u32,
    /// Stop after this many occurrences
    #[arg(long, requires = "repeat")]
    times: Option<u32>,
    /// Last allowed due date
    #[arg(long, requires = "repeat")]
    until: Option<NaiveDate>,
}

impl RepeatArgs {
    fn rule(&self) -> Result<Option<RecurrenceRule>> {
        let Some(frequency) = self.repeat else {
            return Ok(None);
        };
        let mut rule = RecurrenceRule::new(frequency, self.every)?;
        if let Some(count) = self.times {
            rule = rule.with_count(count);
        }
        if let Some(until) = self.until {
            rule = rule.with_until(until);
        }
        rule.validate()?;
        Ok(Some(rule))
    }
}

#[derive(Subcommand)]
enum TrackCommand {
    /// Start tracking a task (stops whatever is running)
    Start { id: TaskId },
    /// Stop the running entry
    Stop,
    /// Show the running entry
    Status,
    /// Entries for a task, or yours when no task is given
    Log { id: Option<TaskId> },
    /// Delete one of your entries
    Delete { id: TimeEntryId },
}

#[derive(Subcommand)]
enum CommentCommand {
    /// Comment on a task; @name mentions notify users
    Add { id: TaskId, body: String },
    /// List comments on a task
    List { id: TaskId },
    /// Edit your comment
    Edit { id: CommentId, body: String },
    /// Delete a comment
    Delete { id: CommentId },
}

#[derive(Subcommand)]
enum NotificationCommand {
    /// List notifications
    List {
        #[arg(long)]
        unread: bool,
    },
    /// Mark one read
    Read { id: NotificationId },
    /// Mark everything read
    ReadAll,
    /// Dismiss a notification
    Dismiss { id: NotificationId },
    /// Send due-soon reminders
    Remind,
}

#[derive(Subcommand)]
enum TeamCommand {
    /// Create a team you own
    Create { name: String },
    /// Teams you belong to
    List,
    /// Members of a team
    Members { team: TeamId },
    /// Add a member
    Add {
        team: TeamId,
        user: String,
        #[arg(long, default_value = "member")]
        role: Role,
    },
    /// Change a member's role
    Role { team: TeamId, user: String, role: Role },
    /// Remove a member
    Remove { team: TeamId, user: String },
    /// Delete a team
    Delete { team: TeamId },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn users(names: Vec<String>) -> BTreeSet<UserId> {
    names.into_iter().map(UserId::new).collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.config.log_level);
    let config = cli.config;
    let session_path = config.session_path();

    // Session commands do not need storage
    match cli.command {
        Commands::Login { user, name } => {
            let session = session::login(&session_path, UserId::new(user), name).await?;
            println!("Signed in as {} ({})", session.user_id, session.display_name);
            return Ok(());
        }
        Commands::Logout => {
            if session::logout(&session_path).await? {
                println!("Signed out");
            } else {
                println!("Not signed in");
            }
            return Ok(());
        }
        Commands::Whoami => {
            match session::load(&session_path).await? {
                Some(s) => println!("{} ({}) since {}", s.user_id, s.display_name, s.started_at),
                None => println!("Not signed in"),
            }
            return Ok(());
        }
        command => {
            let me = session::require(&session_path).await?.user_id;
            let storage = JsonStorage::new(&config.data_dir)
                .await
                .with_context(|| format!("opening {}", config.data_dir.display()))?;
            debug!(data = %config.data_dir.display(), user = %me, "storage opened");
            let app = App::new(shared(storage), &config);
            app.run(&me, command).await?;
        }
    }

    Ok(())
}

struct App {
    tasks: TaskManager<JsonStorage>,
    tracker: TimeTracker<JsonStorage>,
    comments: CommentService<JsonStorage>,
    notifications: NotificationService<JsonStorage>,
    teams: TeamService<JsonStorage>,
    recurrence: RecurrenceService<JsonStorage>,
    reporter: StorageReporter<JsonStorage>,
}

impl App {
    fn new(storage: SharedStorage<JsonStorage>, config: &Config) -> Self {
        let wf = config.workflow();
        Self {
            tasks: TaskManager::new(storage.clone(), wf.clone()),
            tracker: TimeTracker::new(storage.clone()),
            comments: CommentService::new(storage.clone()),
            notifications: NotificationService::new(storage.clone(), wf),
            teams: TeamService::new(storage.clone()),
            recurrence: RecurrenceService::new(storage.clone()),
            reporter: StorageReporter::new(storage),
        }
    }

    async fn run(&self, me: &UserId, command: Commands) -> Result<()> {
        let today = today();
        match command {
            Commands::Login { .. } | Commands::Logout | Commands::Whoami => {}
            Commands::Add {
                title,
                description,
                priority,
                due,
                tags,
                assignees,
                dependencies,
                repeat,
                team,
            } => {
                let mut draft = NewTask::new(title);
                draft.description = description;
                draft.priority = priority;
                draft.due_date = due;
                draft.tags = tags.into_iter().collect();
                draft.assigned_to = users(assignees);
                draft.dependencies = dependencies;
                draft.recurrence = repeat.rule()?;
                draft.team_id = team;
                let task = self.tasks.create(me, draft).await?;
                println!("Added task: {} - {}", task.id, task.title);
            }
            Commands::List {
                status,
                priority,
                assignee,
                tag,
                team,
                from,
                to,
                search,
                overdue,
            } => {
                let filter = TaskFilter {
                    status: status.map(|s| vec![s]),
                    priority: priority.map(|p| vec![p]),
                    assignee: assignee.map(UserId::new),
                    team,
                    tag,
                    due_from: from,
                    due_to: to,
                    text: search,
                    ..Default::default()
                };
                let tasks: Vec<_> = self
                    .tasks
                    .list(me, &filter)
                    .await?
                    .into_iter()
                    .filter(|t| !overdue || t.is_overdue(today))
                    .collect();
                println!("Tasks ({})", tasks.len());
                for task in &tasks {
                    println!("  {}", render::task_line(task, today));
                }
            }
            Commands::Show { id } => {
                let task = self.tasks.get(me, id).await?;
                let gate = self.tasks.gate(me, id).await?;
                render::task_detail(&task, &gate);
            }
            Commands::Update {
                id,
                title,
                description,
                priority,
                due,
                no_due,
                tags,
                repeat,
                no_repeat,
                team,
                no_team,
            } => {
                let recurrence = match repeat.rule()? {
                    Some(rule) => Some(Some(rule)),
                    None if no_repeat => Some(None),
                    None => None,
                };
                let patch = TaskPatch {
                    title,
                    description,
                    priority,
                    due_date: if no_due { Some(None) } else { due.map(Some) },
                    tags: (!tags.is_empty()).then(|| tags.into_iter().collect()),
                    recurrence,
                    team_id: if no_team { Some(None) } else { team.map(Some) },
                };
                let task = self.tasks.update(me, id, patch).await?;
                println!("Updated: {}", render::task_line(&task, today));
            }
            Commands::Status { id, status } => {
                let outcome = self.tasks.set_status(me, id, status).await?;
                println!("{}", render::task_line(&outcome.task, today));
                self.report_completion(&outcome, today);
            }
            Commands::Complete { id } => {
                let outcome = self.tasks.complete(me, id).await?;
                println!("Completed: {}", outcome.task.title);
                self.report_completion(&outcome, today);
            }
            Commands::Assign { id, user } => {
                let task = self.tasks.assign(me, id, &UserId::new(user)).await?;
                println!("Assigned: {}", task.assigned_to.iter().map(|u| u.as_str()).collect::<Vec<_>>().join(", "));
            }
            Commands::Unassign { id, user } => {
                self.tasks.unassign(me, id, &UserId::new(user)).await?;
                println!("Unassigned");
            }
            Commands::Depend { id, on, remove } => {
                let task = if remove {
                    self.tasks.remove_dependency(me, id, on).await?
                } else {
                    self.tasks.add_dependency(me, id, on).await?
                };
                let state = if task.dependencies_met { "ready" } else { "blocked" };
                println!("{} now has {} dependencies ({})", task.id, task.dependencies.len(), state);
            }
            Commands::Attach {
                id,
                name,
                location,
                size,
                content_type,
            } => {
                let attachment = Attachment {
                    name,
                    location,
                    size,
                    content_type,
                    uploaded_by: me.clone(),
                    uploaded_at: chrono::Utc::now(),
                };
                let task = self.tasks.attach(me, id, attachment).await?;
                println!("{} attachments", task.attachments.len());
            }
            Commands::Detach { id, name } => {
                self.tasks.detach(me, id, &name).await?;
                println!("Detached {}", name);
            }
            Commands::Delete { id } => {
                self.tasks.delete(me, id).await?;
                println!("Deleted {}", id);
            }
            Commands::Series { id, preview } => {
                let task = self.tasks.get(me, id).await?;
                for instance in self.recurrence.series(id).await? {
                    println!("  #{} {}", instance.occurrence, render::task_line(&instance, today));
                }
                if let (Some(rule), Some(due)) = (&task.recurrence, task.due_date) {
                    for date in upcoming(rule, due, task.occurrence, preview) {
                        println!("  next: {}", date);
                    }
                }
            }
            Commands::Track { command } => self.track(me, command).await?,
            Commands::Comment { command } => self.comment(me, command).await?,
            Commands::Notifications { command } => self.notify(me, command, today).await?,
            Commands::Team { command } => self.team(me, command).await?,
            Commands::Board { team } => {
                let filter = TaskFilter {
                    team,
                    ..Default::default()
                };
                render::board(&self.reporter.board(me, &filter).await?);
            }
            Commands::Calendar { month } => {
                let (year, month) = match month {
                    Some(m) => parse_month(&m)?,
                    None => (today.year(), today.month()),
                };
                render::calendar(&self.reporter.calendar(me, year, month).await?);
            }
            Commands::Stats => {
                render::stats(&self.reporter.dashboard(me, today).await?);
                let unread = self.notifications.unread_count(me).await?;
                if unread > 0 {
                    println!("Unread notifications: {}", unread);
                }
            }
            Commands::Report { days } => {
                let from = today
                    .checked_sub_days(Days::new(days.saturating_sub(1)))
                    .unwrap_or(today);
                render::productivity(&self.reporter.productivity(me, from, today).await?);
            }
        }
        Ok(())
    }

    fn report_completion(&self, outcome: &taskdeck_workflow::Completion, today: NaiveDate) {
        if let Some(next) = &outcome.successor {
            println!("Next occurrence: {}", render::task_line(next, today));
        }
        if !outcome.dependents_changed.is_empty() {
            println!("Dependents updated: {}", outcome.dependents_changed.len());
        }
    }

    async fn track(&self, me: &UserId, command: TrackCommand) -> Result<()> {
        let now = chrono::Utc::now();
        match command {
            TrackCommand::Start { id } => {
                let entry = self.tracker.start(me, id).await?;
                println!("Tracking {} since {}", entry.task_id, entry.start_time.format("%H:%M:%S"));
            }
            TrackCommand::Stop => {
                let entry = self.tracker.stop(me).await?;
                println!(
                    "Stopped {} after {}",
                    entry.task_id,
                    taskdeck_core::format_duration(entry.duration_secs)
                );
            }
            TrackCommand::Status => match self.tracker.active_entry(me).await? {
                Some(entry) => println!("{}", render::entry_line(&entry, now)),
                None => println!("Not tracking"),
            },
            TrackCommand::Log { id } => {
                let entries = match id {
                    Some(task) => {
                        self.tasks.get(me, task).await?;
                        self.tracker.entries_for_task(task).await?
                    }
                    None => self.tracker.entries_for_user(me).await?,
                };
                let total: u64 = entries.iter().map(|e| e.elapsed_secs(now)).sum();
                for entry in &entries {
                    println!("  {}", render::entry_line(entry, now));
                }
                println!("Total: {}", taskdeck_core::format_duration(total));
            }
            TrackCommand::Delete { id } => {
                self.tracker.delete_entry(me, id).await?;
                println!("Deleted {}", id);
            }
        }
        Ok(())
    }

    async fn comment(&self, me: &UserId, command: CommentCommand) -> Result<()> {
        match command {
            CommentCommand::Add { id, body } => {
                let comment = self.comments.add(me, id, body).await?;
                println!("Comment {} added", comment.id);
                if !comment.mentions.is_empty() {
                    println!(
                        "Mentioned: {}",
                        comment.mentions.iter().map(|u| u.as_str()).collect::<Vec<_>>().join(", ")
                    );
                }
            }
            CommentCommand::List { id } => {
                for comment in self.comments.list(me, id).await? {
                    println!("{}", render::comment_line(&comment));
                }
            }
            CommentCommand::Edit { id, body } => {
                self.comments.edit(me, id, body).await?;
                println!("Edited {}", id);
            }
            CommentCommand::Delete { id } => {
                self.comments.delete(me, id).await?;
                println!("Deleted {}", id);
            }
        }
        Ok(())
    }

    async fn notify(&self, me: &UserId, command: NotificationCommand, today: NaiveDate) -> Result<()> {
        match command {
            NotificationCommand::List { unread } => {
                let list = if unread {
                    self.notifications.unread(me).await?
                } else {
                    self.notifications.list(me).await?
                };
                for n in &list {
                    println!("{}", render::notification_line(n, me));
                }
                if list.is_empty() {
                    println!("No notifications");
                }
            }
            NotificationCommand::Read { id } => {
                self.notifications.mark_read(id, me).await?;
            }
            NotificationCommand::ReadAll => {
                let n = self.notifications.mark_all_read(me).await?;
                println!("Marked {} read", n);
            }
            NotificationCommand::Dismiss { id } => {
                self.notifications.dismiss(id, me).await?;
            }
            NotificationCommand::Remind => {
                let sent = self.notifications.scan_due_soon(today).await?;
                info!(count = sent.len(), "reminders sent");
                println!("Sent {} reminders", sent.len());
            }
        }
        Ok(())
    }

    async fn team(&self, me: &UserId, command: TeamCommand) -> Result<()> {
        match command {
            TeamCommand::Create { name } => {
                let team = self.teams.create_team(name, me).await?;
                println!("Created team {} - {}", team.id, team.name);
            }
            TeamCommand::List => {
                for (team, role) in self.teams.teams_of(me).await? {
                    println!("  {} | {} | {}", team.id, role, team.name);
                }
            }
            TeamCommand::Members { team } => {
                if self.teams.role_of(team, me).await?.is_none() {
                    return Err(anyhow!("you are not a member of team {}", team));
                }
                for m in self.teams.members(team).await? {
                    println!("  {} | {}", m.user_id, m.role);
                }
            }
            TeamCommand::Add { team, user, role } => {
                let m = self.teams.add_member(me, team, &UserId::new(user), role).await?;
                println!("Added {} as {}", m.user_id, m.role);
            }
            TeamCommand::Role { team, user, role } => {
                let m = self.teams.change_role(me, team, &UserId::new(user), role).await?;
                println!("{} is now {}", m.user_id, m.role);
            }
            TeamCommand::Remove { team, user } => {
                self.teams.remove_member(me, team, &UserId::new(user)).await?;
                println!("Removed");
            }
            TeamCommand::Delete { team } => {
                self.teams.delete_team(me, team).await?;
                println!("Deleted team {}", team);
            }
        }
        Ok(())
    }
}

/// Parse `YYYY-MM`.
fn parse_month(s: &str) -> Result<(i32, u32)> {
    let (y, m) = s
        .split_once('-')
        .ok_or_else(|| anyhow!("expected YYYY-MM, got {}", s))?;
    let year: i32 = y.parse().with_context(|| format!("bad year in {}", s))?;
    let month: u32 = m.parse().with_context(|| format!("bad month in {}", s))?;
    if !(1..=12).contains(&month) {
        return Err(anyhow!("month out of range: {}", month));
    }
    Ok((year, month))
}
