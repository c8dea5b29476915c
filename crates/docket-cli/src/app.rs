//! Per-invocation context: resolved config, output mode, and collaborator
//! construction.

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDateTime;
use docket_core::config::DocketConfig;
use docket_core::dates;
use docket_core::index::SearchIndex;
use docket_core::notify::{Level, NotificationSink, Notifier};
use docket_core::service::BacklogService;
use docket_core::store::GitStore;
use docket_search::SqliteIndex;
use tracing::{debug, warn};

use crate::notify::notifier_from_config;
use crate::output::OutputMode;

pub struct App {
    pub config: DocketConfig,
    pub output: OutputMode,
}

impl App {
    pub fn root(&self) -> &Path {
        &self.config.repo.path
    }

    /// Open the repository; it must already be initialized.
    pub fn open_store(&self) -> Result<GitStore> {
        Ok(GitStore::open(self.root(), self.config.repo.identity())?)
    }

    /// The search index, or `None` when search is disabled or the database
    /// cannot be opened.
    pub fn open_index(&self) -> Option<SqliteIndex> {
        if !self.config.search.enabled {
            debug!("search disabled by config");
            return None;
        }
        let path = self.config.search.resolve_db_path(self.root());
        match SqliteIndex::open(&path) {
            Ok(index) => Some(index),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %format!("{err:#}"),
                    "search index unavailable"
                );
                None
            }
        }
    }

    pub fn notifier(&self) -> Notifier {
        notifier_from_config(&self.config.notify)
    }

    /// Send a change notification when `notify.on_change` is set.
    pub fn notify_change(&self, message: &str, channel: &str, level: Level) {
        if !self.config.notify.on_change {
            return;
        }
        let notifier = self.notifier();
        if notifier.is_empty() {
            debug!(channel, "change notification skipped; no channels configured");
            return;
        }
        notifier.send(message, channel, level);
    }
}

/// Local wall-clock time at minute precision.
pub fn now() -> NaiveDateTime {
    dates::now_minute()
}

/// Backlog service over a git store and an optional index.
pub fn backlog<'a>(store: &'a GitStore, index: Option<&'a SqliteIndex>) -> BacklogService<'a> {
    BacklogService::new(store, index.map(|i| i as &dyn SearchIndex))
}
