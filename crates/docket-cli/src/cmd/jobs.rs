//! Scheduled checks: `dk check` runs them once, `dk watch` keeps running
//! them on the configured timetable, `dk notify-test` checks the channels.

use std::io::Write;
use std::thread;
use std::time::Duration as StdDuration;

use anyhow::{Result, bail};
use chrono::Local;
use clap::{Args, ValueEnum};
use docket_core::DocketError;
use docket_core::notify::{Level, NotificationSink};
use docket_core::schedule::{JobKind, JobRun, Scheduler, run_job};
use docket_core::store::GitStore;
use tracing::{error, info};

use crate::app::{self, App};
use crate::output::{render, render_mode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum JobChoice {
    Overdue,
    Stale,
    Summary,
    All,
}

impl JobChoice {
    fn kinds(self) -> Vec<JobKind> {
        match self {
            Self::Overdue => vec![JobKind::OverdueCheck],
            Self::Stale => vec![JobKind::StaleCheck],
            Self::Summary => vec![JobKind::DailySummary],
            Self::All => JobKind::ALL.to_vec(),
        }
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Which check to run.
    #[arg(value_enum, default_value = "all")]
    pub job: JobChoice,

    /// Build the messages but send nothing.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Stop after this many wakeups.
    #[arg(long, hide = true)]
    pub max_wakeups: Option<usize>,
}

/// Accepts nothing.
struct Silent;

impl NotificationSink for Silent {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn send(&self, _message: &str, _channel: &str, _level: Level) -> bool {
        false
    }
}

fn run_kinds(
    app: &App,
    store: &GitStore,
    kinds: &[JobKind],
    sink: &dyn NotificationSink,
) -> Result<Vec<JobRun>> {
    let now = app::now();
    let items = app::backlog(store, None).load_all(false, now)?;
    let stale_days = app.config.scheduler.stale_days;
    Ok(kinds
        .iter()
        .map(|&kind| run_job(kind, &items, now, stale_days, sink))
        .collect())
}

fn write_runs_text(runs: &[JobRun], w: &mut dyn Write) -> std::io::Result<()> {
    for run in runs {
        writeln!(w, "{}\t{}\t{}", run.job, run.found, run.notified)?;
    }
    Ok(())
}

fn write_runs_pretty(runs: &[JobRun], w: &mut dyn Write) -> std::io::Result<()> {
    for run in runs {
        let sent = if run.notified { "sent" } else { "not sent" };
        writeln!(w, "{}: {} found, {sent}", run.job, run.found)?;
        if let Some(message) = &run.message {
            writeln!(w)?;
            for line in message.lines() {
                writeln!(w, "  {line}")?;
            }
            writeln!(w)?;
        }
    }
    Ok(())
}

pub fn run_check(args: &CheckArgs, app: &App) -> Result<()> {
    let store = app.open_store()?;
    let runs = if args.dry_run {
        run_kinds(app, &store, &args.job.kinds(), &Silent)?
    } else {
        run_kinds(app, &store, &args.job.kinds(), &app.notifier())?
    };
    render_mode(app.output, runs.as_slice(), write_runs_text, write_runs_pretty)
}

/// Run the scheduler loop until interrupted (or `--max-wakeups`).
pub fn run_watch(args: &WatchArgs, app: &App) -> Result<()> {
    if !app.config.scheduler.enabled {
        bail!("scheduler is disabled; set scheduler.enabled = true or DOCKET_SCHEDULER_ENABLED=1");
    }
    let store = app.open_store()?;
    let notifier = app.notifier();
    let mut scheduler =
        Scheduler::from_config(&app.config.scheduler, app::now()).map_err(DocketError::from)?;
    for job in scheduler.jobs() {
        info!(
            job = job.kind.as_str(),
            trigger = %job.trigger,
            next_run = %job.next_run,
            "job scheduled"
        );
    }

    let mut wakeups = 0usize;
    while let Some(next) = scheduler.next_wakeup() {
        if args.max_wakeups.is_some_and(|max| wakeups >= max) {
            break;
        }
        let wait = (next - Local::now().naive_local())
            .to_std()
            .unwrap_or(StdDuration::ZERO);
        thread::sleep(wait);
        wakeups += 1;

        let due = scheduler.take_due(app::now());
        if due.is_empty() {
            continue;
        }
        match run_kinds(app, &store, &due, &notifier) {
            Ok(runs) => {
                for run in runs {
                    info!(
                        job = run.job.as_str(),
                        found = run.found,
                        notified = run.notified,
                        "job ran"
                    );
                }
            }
            Err(err) => error!(error = %format!("{err:#}"), "scheduled jobs failed"),
        }
    }
    Ok(())
}

pub fn run_notify_test(app: &App) -> Result<()> {
    let notifier = app.notifier();
    if notifier.is_empty() {
        return Err(DocketError::NotifyUnavailable(
            "set notify.slack_webhook_url or notify.discord_webhook_url".into(),
        )
        .into());
    }
    let results = notifier.test();
    render(app.output, &results, |r, w| {
        for (channel, ok) in r {
            let mark = if *ok { "✓" } else { "✗" };
            writeln!(w, "{mark} {channel}")?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CheckArgs,
    }

    #[test]
    fn check_defaults_to_every_job() {
        let w = Wrapper::parse_from(["test"]);
        assert_eq!(w.args.job, JobChoice::All);
        assert_eq!(w.args.job.kinds(), JobKind::ALL.to_vec());
        assert!(!w.args.dry_run);
    }

    #[test]
    fn single_job_choice() {
        let w = Wrapper::parse_from(["test", "stale", "--dry-run"]);
        assert_eq!(w.args.job.kinds(), vec![JobKind::StaleCheck]);
        assert!(w.args.dry_run);
    }

    #[test]
    fn silent_sink_never_delivers() {
        assert!(!Silent.send("x", "overdue_tasks", Level::Warning));
    }
}
