//! `dk search` and `dk reindex`.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use docket_core::index::SearchHit;
use docket_core::service::DEFAULT_SEARCH_RESULTS;
use serde::Serialize;

use crate::app::{self, App};
use crate::output::render;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text query.
    pub text: String,

    /// Number of results (1-20).
    #[arg(short = 'n', long, default_value_t = DEFAULT_SEARCH_RESULTS)]
    pub limit: usize,
}

fn first_line(document: &str) -> &str {
    document.lines().next().unwrap_or_default()
}

fn write_hits(hits: &[SearchHit], w: &mut dyn Write) -> std::io::Result<()> {
    if hits.is_empty() {
        return writeln!(w, "No matches");
    }
    for hit in hits {
        writeln!(
            w,
            "{}  {:.3}  {}  {}",
            hit.id,
            hit.distance,
            hit.metadata.get("status").map_or("-", String::as_str),
            first_line(&hit.document)
        )?;
    }
    Ok(())
}

pub fn run_search(args: &SearchArgs, app: &App) -> Result<()> {
    let store = app.open_store()?;
    let index = app.open_index();
    let hits = app::backlog(&store, index.as_ref()).search(&args.text, args.limit)?;
    render(app.output, hits.as_slice(), write_hits)
}

#[derive(Debug, Serialize)]
struct ReindexReport {
    indexed: usize,
}

pub fn run_reindex(app: &App) -> Result<()> {
    let store = app.open_store()?;
    let index = app.open_index();
    let indexed = app::backlog(&store, index.as_ref()).reindex(app::now())?;
    render(app.output, &ReindexReport { indexed }, |r, w| {
        writeln!(w, "✓ Indexed {} items", r.indexed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: SearchArgs,
    }

    #[test]
    fn limit_defaults_to_five() {
        let w = Wrapper::parse_from(["test", "login bug"]);
        assert_eq!(w.args.limit, 5);
        assert_eq!(w.args.text, "login bug");
    }

    #[test]
    fn first_line_of_empty_document_is_empty() {
        assert_eq!(first_line(""), "");
        assert_eq!(first_line("Title\nbody"), "Title");
    }
}
