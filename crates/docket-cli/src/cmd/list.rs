//! `dk list`: filter, sort and paginate backlog items.
//!
//! Flags map one-to-one onto [`QueryParams`]. `--params` takes the same
//! parameters as a JSON object; explicit flags win over it.

use std::io::Write;

use anyhow::{Context as _, Result};
use clap::Args;
use docket_core::DocketError;
use docket_core::query::{AdvancedQuery, QueryPage, QueryParams, QueryStats};

use crate::app::{self, App};
use crate::output::{pretty_kv, pretty_section, render_mode};
use crate::view::{item_line, item_row};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Case-insensitive substring of the title or description.
    #[arg(short = 'q', long = "text")]
    pub full_text: Option<String>,

    /// Substring of the title.
    #[arg(long = "title")]
    pub title_contains: Option<String>,

    /// Substring of the description.
    #[arg(long = "description")]
    pub description_contains: Option<String>,

    /// Statuses to include (comma-separated).
    #[arg(short, long, value_delimiter = ',')]
    pub status: Vec<String>,

    /// Assignees to include (comma-separated).
    #[arg(short, long, value_delimiter = ',')]
    pub assignee: Vec<String>,

    /// Exact priority; overrides the range flags.
    #[arg(short, long)]
    pub priority: Option<i64>,

    #[arg(long = "min-priority")]
    pub priority_min: Option<i64>,

    #[arg(long = "max-priority")]
    pub priority_max: Option<i64>,

    /// Match items carrying any of these tags.
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Match items carrying all of these tags.
    #[arg(long = "all-tags", value_delimiter = ',')]
    pub tags_all: Vec<String>,

    #[arg(long)]
    pub created_after: Option<String>,
    #[arg(long)]
    pub created_before: Option<String>,
    #[arg(long)]
    pub updated_after: Option<String>,
    #[arg(long)]
    pub updated_before: Option<String>,
    #[arg(long)]
    pub due_after: Option<String>,
    #[arg(long)]
    pub due_before: Option<String>,

    /// Only items with a due date.
    #[arg(long, conflicts_with = "no_due")]
    pub has_due: bool,

    /// Only items without a due date.
    #[arg(long)]
    pub no_due: bool,

    /// created_at, updated_at, due_date, priority, title or status.
    #[arg(long = "sort")]
    pub sort_by: Option<String>,

    /// asc or desc.
    #[arg(long = "order")]
    pub sort_order: Option<String>,

    #[arg(short = 'n', long)]
    pub limit: Option<i64>,

    #[arg(long)]
    pub offset: Option<i64>,

    /// Include archived backlog items.
    #[arg(long)]
    pub archived: bool,

    /// Attach counts by status, priority and assignee.
    #[arg(long)]
    pub stats: bool,

    /// Query parameters as a JSON object.
    #[arg(long, value_name = "JSON")]
    pub params: Option<String>,
}

fn overlay<T>(slot: &mut Option<T>, flag: Option<T>) {
    if flag.is_some() {
        *slot = flag;
    }
}

fn overlay_list(slot: &mut Option<Vec<String>>, flag: &[String]) {
    if !flag.is_empty() {
        *slot = Some(flag.to_vec());
    }
}

impl ListArgs {
    pub fn to_params(&self) -> Result<QueryParams> {
        let mut params = match &self.params {
            Some(raw) => serde_json::from_str::<QueryParams>(raw)
                .context("--params must be a JSON object of query parameters")?,
            None => QueryParams::default(),
        };

        overlay(&mut params.full_text, self.full_text.clone());
        overlay(&mut params.title_contains, self.title_contains.clone());
        overlay(&mut params.description_contains, self.description_contains.clone());
        overlay_list(&mut params.status, &self.status);
        overlay_list(&mut params.assignee, &self.assignee);
        overlay(&mut params.priority, self.priority);
        overlay(&mut params.priority_min, self.priority_min);
        overlay(&mut params.priority_max, self.priority_max);
        overlay_list(&mut params.tags, &self.tags);
        overlay_list(&mut params.tags_all, &self.tags_all);
        overlay(&mut params.created_after, self.created_after.clone());
        overlay(&mut params.created_before, self.created_before.clone());
        overlay(&mut params.updated_after, self.updated_after.clone());
        overlay(&mut params.updated_before, self.updated_before.clone());
        overlay(&mut params.due_after, self.due_after.clone());
        overlay(&mut params.due_before, self.due_before.clone());
        if self.has_due {
            params.has_due_date = Some(true);
        } else if self.no_due {
            params.has_due_date = Some(false);
        }
        overlay(&mut params.sort_by, self.sort_by.clone());
        overlay(&mut params.sort_order, self.sort_order.clone());
        overlay(&mut params.limit, self.limit);
        overlay(&mut params.offset, self.offset);
        params.include_archived |= self.archived;
        params.include_stats |= self.stats;
        Ok(params)
    }
}

fn write_stats(w: &mut dyn Write, stats: &QueryStats) -> std::io::Result<()> {
    pretty_section(w, "Stats")?;
    pretty_kv(w, "Total", stats.total_items.to_string())?;
    pretty_kv(w, "Matched", stats.filtered_items.to_string())?;
    pretty_kv(w, "Overdue", stats.overdue_count.to_string())?;
    pretty_kv(w, "With due", stats.with_due_date.to_string())?;
    for (heading, counts) in [
        ("Status", &stats.by_status),
        ("Priority", &stats.by_priority),
        ("Assignee", &stats.by_assignee),
    ] {
        let joined = counts
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("  ");
        pretty_kv(w, heading, joined)?;
    }
    Ok(())
}

fn write_text(page: &QueryPage, w: &mut dyn Write) -> std::io::Result<()> {
    for view in &page.results {
        item_row(w, &view.item, view.is_overdue)?;
    }
    Ok(())
}

fn write_pretty(page: &QueryPage, w: &mut dyn Write) -> std::io::Result<()> {
    if page.results.is_empty() {
        writeln!(w, "No matching items ({} total before paging)", page.total)?;
    } else {
        writeln!(
            w,
            "Showing {}-{} of {}",
            page.offset + 1,
            page.offset + page.count,
            page.total
        )?;
        writeln!(w)?;
        for view in &page.results {
            item_line(w, &view.item, view.is_overdue)?;
        }
    }
    if let Some(stats) = &page.stats {
        writeln!(w)?;
        write_stats(w, stats)?;
    }
    Ok(())
}

pub fn run_list(args: &ListArgs, app: &App) -> Result<()> {
    let query = AdvancedQuery::try_from(args.to_params()?).map_err(DocketError::from)?;
    let store = app.open_store()?;
    let service = app::backlog(&store, None);
    let page = service.query(&query, app::now())?;
    render_mode(app.output, &page, write_text, write_pretty)
}
