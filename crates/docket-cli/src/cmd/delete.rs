//! `dk delete` and `dk archive`.

use anyhow::Result;
use clap::Args;
use docket_core::service::{Archived, DeleteMode, Deleted, MeetingService};

use crate::app::{self, App};
use crate::output::render;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Item id.
    pub id: String,

    /// Remove the file outright instead of archiving it first.
    #[arg(long)]
    pub permanent: bool,
}

#[derive(Args, Debug)]
pub struct ArchiveArgs {
    /// Item id, or meeting id with `--meeting`.
    pub id: String,

    /// Reason recorded at the top of the archived file.
    #[arg(short, long, default_value = "Archived")]
    pub reason: String,

    /// Archive a meeting instead of a backlog item.
    #[arg(long)]
    pub meeting: bool,
}

pub fn run_delete(args: &DeleteArgs, app: &App) -> Result<()> {
    let store = app.open_store()?;
    let index = app.open_index();
    let deleted = app::backlog(&store, index.as_ref()).delete(&args.id, args.permanent)?;
    render(app.output, &deleted, |d: &Deleted, w| match d.status {
        DeleteMode::ArchivedAndDeleted => writeln!(w, "✓ Archived and removed {}", d.id),
        DeleteMode::Deleted => writeln!(w, "✓ Deleted {}", d.id),
    })
}

pub fn run_archive(args: &ArchiveArgs, app: &App) -> Result<()> {
    let store = app.open_store()?;
    let archived = if args.meeting {
        MeetingService::new(&store).archive(&args.id, &args.reason)?
    } else {
        let index = app.open_index();
        app::backlog(&store, index.as_ref()).archive(&args.id, &args.reason)?
    };
    render(app.output, &archived, |a: &Archived, w| {
        writeln!(w, "✓ Archived {} {} ({})", a.kind, a.id, a.reason)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ArchiveArgs,
    }

    #[test]
    fn archive_defaults_to_backlog_with_generic_reason() {
        let w = Wrapper::parse_from(["test", "abc12345"]);
        assert!(!w.args.meeting);
        assert_eq!(w.args.reason, "Archived");
    }
}
