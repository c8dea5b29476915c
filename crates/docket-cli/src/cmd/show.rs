//! `dk show`: one backlog item.

use anyhow::Result;
use clap::Args;
use docket_core::query::ItemView;

use crate::app::{self, App};
use crate::output::render_mode;
use crate::view::{item_pretty, item_row};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Item id.
    pub id: String,
}

pub fn run_show(args: &ShowArgs, app: &App) -> Result<()> {
    let store = app.open_store()?;
    let service = app::backlog(&store, None);
    let now = app::now();
    let item = service.get(&args.id, now)?;
    let view = ItemView {
        is_overdue: item.is_overdue(now),
        item,
    };
    render_mode(
        app.output,
        &view,
        |v, w| item_row(w, &v.item, v.is_overdue),
        |v, w| item_pretty(w, &v.item, v.is_overdue),
    )
}
