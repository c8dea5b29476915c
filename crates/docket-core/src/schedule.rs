//! Scheduled checks over the backlog.
//!
//! [`Scheduler`] is a plain in-memory timetable: the caller's loop asks
//! [`Scheduler::take_due`] which jobs are ready, loads items, and hands them
//! to [`run_job`]. Reports and message formatters are pure functions of the
//! items and `now`.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::info;

use crate::config::SchedulerConfig;
use crate::error::ValidationError;
use crate::model::item::{BacklogItem, Status};
use crate::notify::{Level, NotificationSink};

/// Entries listed in a message before "... and N more".
const MESSAGE_PREVIEW: usize = 5;

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Every day at a wall-clock time.
    Daily { hour: u32, minute: u32 },
    /// Every N hours (at least one).
    Every(u32),
}

impl Trigger {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming `field` when the time is invalid.
    pub fn daily(field: &'static str, hour: u32, minute: u32) -> Result<Self, ValidationError> {
        if NaiveTime::from_hms_opt(hour, minute, 0).is_none() {
            return Err(ValidationError::new(
                field,
                format!("{hour}:{minute:02} is not a valid time of day"),
            ));
        }
        Ok(Self::Daily { hour, minute })
    }

    /// First firing strictly after `t`.
    #[must_use]
    pub fn next_after(self, t: NaiveDateTime) -> NaiveDateTime {
        match self {
            Self::Daily { hour, minute } => {
                let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
                let today = t.date().and_time(time);
                if today > t {
                    today
                } else {
                    today + Duration::days(1)
                }
            }
            Self::Every(hours) => t + Duration::hours(i64::from(hours.max(1))),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily { hour, minute } => write!(f, "daily at {hour:02}:{minute:02}"),
            Self::Every(hours) => write!(f, "every {hours}h"),
        }
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    OverdueCheck,
    StaleCheck,
    DailySummary,
}

impl JobKind {
    pub const ALL: [Self; 3] = [Self::OverdueCheck, Self::StaleCheck, Self::DailySummary];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OverdueCheck => "overdue_check",
            Self::StaleCheck => "stale_check",
            Self::DailySummary => "daily_summary",
        }
    }

    /// Notification topic the job reports to.
    #[must_use]
    pub const fn channel(self) -> &'static str {
        match self {
            Self::OverdueCheck => "overdue_tasks",
            Self::StaleCheck => "stale_tasks",
            Self::DailySummary => "daily_summary",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledJob {
    pub kind: JobKind,
    #[serde(serialize_with = "serialize_display")]
    pub trigger: Trigger,
    pub next_run: NaiveDateTime,
}

fn serialize_display<S: serde::Serializer>(value: &Trigger, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    jobs: Vec<ScheduledJob>,
}

impl Scheduler {
    /// Build the three standard jobs, each first due at its next firing
    /// after `now`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a configured hour is out of range.
    pub fn from_config(
        config: &SchedulerConfig,
        now: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        let mut scheduler = Self::default();
        scheduler.add(
            JobKind::OverdueCheck,
            Trigger::daily("overdue_check_hour", config.overdue_check_hour, 0)?,
            now,
        );
        scheduler.add(
            JobKind::StaleCheck,
            Trigger::Every(config.check_interval_hours),
            now,
        );
        scheduler.add(
            JobKind::DailySummary,
            Trigger::daily("summary_hour", config.summary_hour, 0)?,
            now,
        );
        Ok(scheduler)
    }

    pub fn add(&mut self, kind: JobKind, trigger: Trigger, now: NaiveDateTime) {
        self.jobs.push(ScheduledJob {
            kind,
            trigger,
            next_run: trigger.next_after(now),
        });
    }

    #[must_use]
    pub fn jobs(&self) -> &[ScheduledJob] {
        &self.jobs
    }

    /// Jobs whose next run is at or before `now`, in registration order.
    /// Each returned job is advanced to its next firing after `now`, so a
    /// job missed several times runs once.
    pub fn take_due(&mut self, now: NaiveDateTime) -> Vec<JobKind> {
        let mut due = Vec::new();
        for job in &mut self.jobs {
            if job.next_run <= now {
                due.push(job.kind);
                job.next_run = job.trigger.next_after(now);
            }
        }
        due
    }

    /// Earliest pending run.
    #[must_use]
    pub fn next_wakeup(&self) -> Option<NaiveDateTime> {
        self.jobs.iter().map(|j| j.next_run).min()
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverdueEntry {
    pub id: String,
    pub title: String,
    pub assignee: Option<String>,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleEntry {
    pub id: String,
    pub title: String,
    pub assignee: Option<String>,
    pub last_updated: NaiveDate,
    pub days_stale: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub overdue: usize,
    pub due_today: usize,
    pub due_this_week: usize,
}

#[must_use]
pub fn overdue_report(items: &[BacklogItem], now: NaiveDateTime) -> Vec<OverdueEntry> {
    items
        .iter()
        .filter(|item| item.is_overdue(now))
        .filter_map(|item| {
            Some(OverdueEntry {
                id: item.id.clone(),
                title: item.title.clone(),
                assignee: item.assignee.clone(),
                due_date: item.due_date?,
                days_overdue: item.days_overdue(now),
            })
        })
        .collect()
}

#[must_use]
pub fn stale_report(
    items: &[BacklogItem],
    now: NaiveDateTime,
    threshold_days: i64,
) -> Vec<StaleEntry> {
    items
        .iter()
        .filter(|item| item.is_stale(now, threshold_days))
        .map(|item| StaleEntry {
            id: item.id.clone(),
            title: item.title.clone(),
            assignee: item.assignee.clone(),
            last_updated: item.updated_at.date(),
            days_stale: item.days_since_update(now),
        })
        .collect()
}

/// Counts over every item. `due_today` and `due_this_week` only count open
/// items; the week is the seven days after today.
#[must_use]
pub fn daily_summary(items: &[BacklogItem], now: NaiveDateTime) -> DailySummary {
    let today = now.date();
    let week_end = today + Duration::days(7);
    let mut summary = DailySummary {
        total: items.len(),
        ..DailySummary::default()
    };
    for item in items {
        *summary
            .by_status
            .entry(item.status.as_str().to_string())
            .or_default() += 1;
        if item.is_overdue(now) {
            summary.overdue += 1;
        }
        match item.due_date {
            Some(due) if !item.status.is_closed() && due == today => summary.due_today += 1,
            Some(due) if !item.status.is_closed() && due > today && due <= week_end => {
                summary.due_this_week += 1;
            }
            _ => {}
        }
    }
    summary
}

fn push_more(message: &mut String, total: usize, noun: &str) {
    if total > MESSAGE_PREVIEW {
        let _ = writeln!(message, "... and {} more {noun}", total - MESSAGE_PREVIEW);
    }
}

#[must_use]
pub fn format_overdue(entries: &[OverdueEntry]) -> String {
    let mut message = format!("⚠️ **{} Overdue Tasks**\n\n", entries.len());
    for entry in entries.iter().take(MESSAGE_PREVIEW) {
        let _ = writeln!(message, "• **{}**", entry.title);
        if let Some(assignee) = &entry.assignee {
            let _ = writeln!(message, "  Assignee: {assignee}");
        }
        let _ = writeln!(
            message,
            "  Due: {} ({} days overdue)\n",
            entry.due_date, entry.days_overdue
        );
    }
    push_more(&mut message, entries.len(), "overdue tasks");
    message
}

#[must_use]
pub fn format_stale(entries: &[StaleEntry], threshold_days: i64) -> String {
    let mut message = format!("🕰️ **{} Stale Tasks**\n\n", entries.len());
    let _ = writeln!(
        message,
        "Tasks not updated for more than {threshold_days} days:\n"
    );
    for entry in entries.iter().take(MESSAGE_PREVIEW) {
        let _ = writeln!(message, "• **{}**", entry.title);
        if let Some(assignee) = &entry.assignee {
            let _ = writeln!(message, "  Assignee: {assignee}");
        }
        let _ = writeln!(
            message,
            "  Last updated: {} ({} days ago)\n",
            entry.last_updated, entry.days_stale
        );
    }
    push_more(&mut message, entries.len(), "stale tasks");
    message
}

#[must_use]
pub fn format_summary(summary: &DailySummary) -> String {
    let count = |status: Status| summary.by_status.get(status.as_str()).copied().unwrap_or(0);
    let mut message = String::from("📊 **Daily Task Summary**\n\n");
    let _ = writeln!(message, "**Total Tasks:** {}\n", summary.total);
    message.push_str("**Status Breakdown:**\n");
    let _ = writeln!(message, "• Todo: {}", count(Status::Todo));
    let _ = writeln!(message, "• In Progress: {}", count(Status::InProgress));
    let _ = writeln!(message, "• Review: {}", count(Status::Review));
    let _ = writeln!(message, "• Blocked: {}", count(Status::Blocked));
    let _ = writeln!(message, "• Done: {}\n", count(Status::Done));

    if summary.overdue > 0 {
        let _ = writeln!(message, "⚠️ **Overdue:** {} tasks", summary.overdue);
    }
    if summary.due_today > 0 {
        let _ = writeln!(message, "📅 **Due Today:** {} tasks", summary.due_today);
    }
    if summary.due_this_week > 0 {
        let _ = writeln!(message, "📆 **Due This Week:** {} tasks", summary.due_this_week);
    }
    message
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

/// What one job run found and whether anyone was told.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRun {
    pub job: JobKind,
    /// Overdue or stale items found; total items for the summary.
    pub found: usize,
    pub notified: bool,
    pub message: Option<String>,
}

/// Evaluate `job` over `items` and notify when there is something to say.
/// Overdue and stale checks stay quiet when nothing matches; the summary
/// always sends.
pub fn run_job(
    job: JobKind,
    items: &[BacklogItem],
    now: NaiveDateTime,
    stale_days: i64,
    sink: &dyn NotificationSink,
) -> JobRun {
    let (found, message, level) = match job {
        JobKind::OverdueCheck => {
            let entries = overdue_report(items, now);
            let message = (!entries.is_empty()).then(|| format_overdue(&entries));
            (entries.len(), message, Level::Warning)
        }
        JobKind::StaleCheck => {
            let entries = stale_report(items, now, stale_days);
            let message = (!entries.is_empty()).then(|| format_stale(&entries, stale_days));
            (entries.len(), message, Level::Normal)
        }
        JobKind::DailySummary => {
            let summary = daily_summary(items, now);
            (summary.total, Some(format_summary(&summary)), Level::Info)
        }
    };

    let notified = message
        .as_deref()
        .is_some_and(|text| sink.send(text, job.channel(), level));
    info!(job = job.as_str(), found, notified, "scheduled job finished");

    JobRun {
        job,
        found,
        notified,
        message,
    }
}
