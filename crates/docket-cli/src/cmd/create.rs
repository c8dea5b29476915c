//! `dk create`: add a backlog item.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use docket_core::model::{NewItem, Status};
use docket_core::notify::{Level, assignment_message};

use crate::app::{self, App};
use crate::cmd::{parse_due, parse_status};
use crate::output::render;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Title of the new item.
    #[arg(short, long)]
    pub title: String,

    /// Description body (markdown).
    #[arg(short, long)]
    pub description: Option<String>,

    /// Person responsible.
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// 1 (highest) to 5 (lowest); defaults to 3.
    #[arg(short, long)]
    pub priority: Option<u8>,

    /// Tags (comma-separated or repeated).
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Due date (YYYY-MM-DD).
    #[arg(long, value_parser = parse_due)]
    pub due: Option<NaiveDate>,

    /// Initial status; defaults to todo.
    #[arg(long, value_parser = parse_status)]
    pub status: Option<Status>,

    /// Explicit id instead of a generated one.
    #[arg(long, hide = true)]
    pub id: Option<String>,
}

impl CreateArgs {
    fn to_new_item(&self) -> NewItem {
        NewItem {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone().unwrap_or_default(),
            status: self.status,
            assignee: self.assignee.clone(),
            priority: self.priority,
            tags: self.tags.clone(),
            due_date: self.due,
        }
    }
}

pub fn run_create(args: &CreateArgs, app: &App) -> Result<()> {
    let store = app.open_store()?;
    let index = app.open_index();
    let service = app::backlog(&store, index.as_ref());

    let created = service.create(args.to_new_item(), app::now())?;
    if let Some(assignee) = &created.record.assignee {
        app.notify_change(
            &assignment_message(&created.record.title, assignee, created.record.due_date),
            "task_assignments",
            Level::Normal,
        );
    }

    render(app.output, &created, |c, w| {
        writeln!(w, "✓ Created {} {}", c.record.id, c.record.title)
    })
}
