//! `dk init`: create the repository layout and initial commit.

use anyhow::Result;
use docket_core::store::GitStore;
use serde::Serialize;

use crate::app::App;
use crate::output::render;

#[derive(Debug, Serialize)]
struct InitReport {
    path: String,
    created: bool,
}

pub fn run_init(app: &App) -> Result<()> {
    let (store, created) = GitStore::open_or_init(app.root(), app.config.repo.identity())?;
    let report = InitReport {
        path: store.root().display().to_string(),
        created,
    };
    render(app.output, &report, |r, w| {
        if r.created {
            writeln!(w, "✓ Initialized docket repository at {}", r.path)
        } else {
            writeln!(w, "Repository already initialized at {}", r.path)
        }
    })
}
