//! `dk sync`: pull, reindex, push. `dk history`: commits touching a file.

use anyhow::Result;
use clap::Args;
use docket_core::model::item::filename_for;
use docket_core::model::{BACKLOG_DIR, MEETING_DIR};
use docket_core::store::{HistoryEntry, file_stem, join};
use serde::Serialize;

use crate::app::{self, App};
use crate::output::render;

/// Result of a `dk sync` run.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    /// Whether a pull ran; `false` without a remote or on failure.
    pub pulled: bool,
    /// Documents indexed after the pull, when search is enabled.
    pub reindexed: Option<usize>,
    /// Whether a push ran.
    pub pushed: bool,
    /// Non-fatal failures collected along the way.
    pub errors: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Skip `git push` after pulling.
    #[arg(long)]
    pub no_push: bool,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Item id, or meeting id with `--meeting`.
    pub id: String,

    #[arg(long)]
    pub meeting: bool,

    /// Number of commits to show.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,
}

impl HistoryArgs {
    fn path(&self) -> String {
        if self.meeting {
            join(MEETING_DIR, &filename_for(file_stem(&self.id)))
        } else {
            join(BACKLOG_DIR, &filename_for(&self.id))
        }
    }
}

/// Each step runs even when an earlier one failed, so the report shows the
/// whole picture.
pub fn run_sync(args: &SyncArgs, app: &App) -> Result<()> {
    let store = app.open_store()?;
    let mut report = SyncReport::default();

    match store.pull() {
        Ok(pulled) => report.pulled = pulled,
        Err(e) => report.errors.push(format!("git pull: {e}")),
    }

    if let Some(index) = app.open_index() {
        match app::backlog(&store, Some(&index)).reindex(app::now()) {
            Ok(count) => report.reindexed = Some(count),
            Err(e) => report.errors.push(format!("reindex: {e}")),
        }
    }

    if !args.no_push {
        match store.push() {
            Ok(pushed) => report.pushed = pushed,
            Err(e) => report.errors.push(format!("git push: {e}")),
        }
    }

    render(app.output, &report, |r, w| {
        writeln!(w, "pulled:    {}", r.pulled)?;
        match r.reindexed {
            Some(count) => writeln!(w, "reindexed: {count}")?,
            None => writeln!(w, "reindexed: skipped")?,
        }
        writeln!(w, "pushed:    {}", r.pushed)?;
        for error in &r.errors {
            writeln!(w, "✗ {error}")?;
        }
        Ok(())
    })
}

pub fn run_history(args: &HistoryArgs, app: &App) -> Result<()> {
    let store = app.open_store()?;
    let entries = store.history(&args.path(), args.limit)?;
    render(app.output, entries.as_slice(), |entries: &[HistoryEntry], w| {
        for entry in entries {
            writeln!(
                w,
                "{}  {}  {}  {}",
                &entry.sha[..entry.sha.len().min(8)],
                entry.date,
                entry.author,
                entry.message
            )?;
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
        args: HistoryArgs,
    }

    #[test]
    fn history_paths_follow_layout() {
        let w = Wrapper::parse_from(["test", "abc12345"]);
        assert_eq!(w.args.path(), "backlogs/abc12345.md");
        let w = Wrapper::parse_from(["test", "--meeting", "2024-05-15-standup.md"]);
        assert_eq!(w.args.path(), "meetings/2024-05-15-standup.md");
        assert_eq!(w.args.limit, 10);
    }
}
