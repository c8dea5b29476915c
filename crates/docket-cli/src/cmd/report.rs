//! Read-only reports: `dk overdue`, `dk stale`, `dk summary`.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use docket_core::schedule::{DailySummary, daily_summary, format_summary};
use docket_core::service::{OverdueItem, StaleItem};

use crate::app::{self, App};
use crate::output::{pretty_kv, pretty_section, render, render_mode};

#[derive(Args, Debug)]
pub struct StaleArgs {
    /// Days without an update before an open item counts as stale.
    /// Defaults to `scheduler.stale_days`.
    #[arg(short, long)]
    pub days: Option<i64>,
}

fn write_overdue(items: &[OverdueItem], w: &mut dyn Write) -> std::io::Result<()> {
    if items.is_empty() {
        return writeln!(w, "✓ Nothing overdue");
    }
    for item in items {
        let e = &item.entry;
        writeln!(
            w,
            "{}  {}  due {} ({}d late)  {}  {}",
            e.id,
            item.status.as_str(),
            e.due_date,
            e.days_overdue,
            e.assignee.as_deref().unwrap_or("-"),
            e.title
        )?;
    }
    Ok(())
}

pub fn run_overdue(app: &App) -> Result<()> {
    let store = app.open_store()?;
    let items = app::backlog(&store, None).overdue(app::now())?;
    render(app.output, items.as_slice(), write_overdue)
}

fn write_stale(items: &[StaleItem], w: &mut dyn Write) -> std::io::Result<()> {
    if items.is_empty() {
        return writeln!(w, "✓ Nothing stale");
    }
    for item in items {
        let e = &item.entry;
        writeln!(
            w,
            "{}  {}  last touched {} ({}d)  {}  {}",
            e.id,
            item.status.as_str(),
            e.last_updated,
            e.days_stale,
            e.assignee.as_deref().unwrap_or("-"),
            e.title
        )?;
    }
    Ok(())
}

pub fn run_stale(args: &StaleArgs, app: &App) -> Result<()> {
    let days = args.days.unwrap_or(app.config.scheduler.stale_days);
    let store = app.open_store()?;
    let items = app::backlog(&store, None).stale(app::now(), days)?;
    render(app.output, items.as_slice(), write_stale)
}

fn write_summary_pretty(summary: &DailySummary, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Summary")?;
    pretty_kv(w, "Total", summary.total.to_string())?;
    for (status, count) in &summary.by_status {
        pretty_kv(w, status, count.to_string())?;
    }
    pretty_kv(w, "Overdue", summary.overdue.to_string())?;
    pretty_kv(w, "Due today", summary.due_today.to_string())?;
    pretty_kv(w, "Due this week", summary.due_this_week.to_string())
}

pub fn run_summary(app: &App) -> Result<()> {
    let store = app.open_store()?;
    let now = app::now();
    let items = app::backlog(&store, None).load_all(false, now)?;
    let summary = daily_summary(&items, now);
    render_mode(
        app.output,
        &summary,
        |s, w| write!(w, "{}", format_summary(s)),
        write_summary_pretty,
    )
}
