//! `dk update` and `dk status`: change fields of an existing item.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use docket_core::model::{ItemPatch, Status};
use docket_core::notify::{Level, assignment_message, status_change_message};
use docket_core::service::Updated;

use crate::app::{self, App};
use crate::cmd::{parse_due, parse_status};
use crate::output::render;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Item id.
    pub id: String,

    #[arg(short, long)]
    pub title: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// New assignee; an empty value clears it.
    #[arg(short, long)]
    pub assignee: Option<String>,

    #[arg(short, long)]
    pub priority: Option<u8>,

    /// Replace all tags (comma-separated or repeated).
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    #[arg(long, value_parser = parse_due)]
    pub due: Option<NaiveDate>,

    #[arg(long, value_parser = parse_status)]
    pub status: Option<Status>,
}

impl UpdateArgs {
    fn to_patch(&self) -> ItemPatch {
        ItemPatch {
            title: self.title.clone(),
            description: self.description.clone(),
            assignee: self.assignee.clone(),
            priority: self.priority,
            tags: self.tags.clone(),
            due_date: self.due,
            status: self.status,
        }
    }
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Item id.
    pub id: String,

    /// todo, in_progress, review, done, blocked or cancelled.
    #[arg(value_parser = parse_status)]
    pub status: Status,
}

fn announce(app: &App, updated: &Updated, assignee_touched: bool) {
    let item = &updated.item;
    if let (true, Some(assignee)) = (assignee_touched, &item.assignee) {
        app.notify_change(
            &assignment_message(&item.title, assignee, item.due_date),
            "task_assignments",
            Level::Normal,
        );
    }
    if updated.previous_status != item.status {
        let (message, level) =
            status_change_message(&item.title, updated.previous_status, item.status);
        app.notify_change(&message, "status_updates", level);
    }
}

fn print(app: &App, updated: &Updated) -> Result<()> {
    render(app.output, updated, |u, w| {
        if u.changes.is_empty() {
            writeln!(w, "✓ {} unchanged", u.item.id)
        } else {
            writeln!(w, "✓ Updated {}: {}", u.item.id, u.changes.join(", "))
        }
    })
}

pub fn run_update(args: &UpdateArgs, app: &App) -> Result<()> {
    let store = app.open_store()?;
    let index = app.open_index();
    let service = app::backlog(&store, index.as_ref());
    let updated = service.update(&args.id, args.to_patch(), app::now())?;
    announce(app, &updated, args.assignee.is_some());
    print(app, &updated)
}

pub fn run_status(args: &StatusArgs, app: &App) -> Result<()> {
    let store = app.open_store()?;
    let index = app.open_index();
    let service = app::backlog(&store, index.as_ref());
    let updated = service.set_status(&args.id, args.status, app::now())?;
    announce(app, &updated, false);
    print(app, &updated)
}
