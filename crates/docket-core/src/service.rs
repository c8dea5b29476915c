//! Backlog and meeting operations over injected collaborators.
//!
//! Services borrow a [`ContentStore`] and optionally a [`SearchIndex`]; they
//! hold no other state. Every read loads documents fresh from the store.
//! Index failures are logged and never fail a store operation.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec;
use crate::dates::{self, format_timestamp};
use crate::error::{DocketError, ValidationError};
use crate::index::{Metadata, SearchHit, SearchIndex};
use crate::model::item::{BacklogItem, ItemPatch, NewItem, Status, filename_for};
use crate::model::meeting::{self, Meeting, NewMeeting};
use crate::model::{ARCHIVE_DIR, BACKLOG_DIR, MEETING_DIR};
use crate::query::{AdvancedQuery, QueryPage};
use crate::schedule::{OverdueEntry, StaleEntry, overdue_report, stale_report};
use crate::store::{self, ContentStore, Revision};

pub const DEFAULT_SEARCH_RESULTS: usize = 5;
pub const MAX_SEARCH_RESULTS: usize = 20;

/// Reason recorded when a delete archives first.
pub const DELETE_ARCHIVE_REASON: &str = "Archived before deletion";

fn backlog_path(id: &str) -> String {
    store::join(BACKLOG_DIR, &filename_for(id))
}

fn meeting_path(id: &str) -> String {
    store::join(MEETING_DIR, &format!("{id}.md"))
}

fn validate_id(kind: &'static str, id: &str) -> Result<(), DocketError> {
    if id.is_empty()
        || id.contains(['/', '\\'])
        || id.starts_with('.')
        || id.chars().any(char::is_control)
    {
        return Err(ValidationError::new("id", format!("'{id}' is not a valid {kind} id")).into());
    }
    Ok(())
}

/// True when a document carries backlog metadata lines.
fn looks_like_backlog(text: &str) -> bool {
    text.lines()
        .any(|line| line.starts_with("**ID:**") || line.starts_with("**Status:**"))
}

/// Metadata stored beside each indexed backlog item.
#[must_use]
pub fn index_metadata(item: &BacklogItem) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("type".into(), "backlog".into());
    metadata.insert("status".into(), item.status.as_str().into());
    metadata.insert("priority".into(), item.priority.to_string());
    metadata.insert("created_at".into(), format_timestamp(item.created_at));
    if let Some(assignee) = &item.assignee {
        metadata.insert("assignee".into(), assignee.clone());
    }
    metadata
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Created<T> {
    #[serde(flatten)]
    pub record: T,
    pub file_path: String,
    pub revision: Revision,
}

#[derive(Debug, Clone, Serialize)]
pub struct Updated {
    #[serde(flatten)]
    pub item: BacklogItem,
    pub previous_status: Status,
    pub changes: Vec<String>,
    pub revision: Revision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    ArchivedAndDeleted,
    Deleted,
}

#[derive(Debug, Clone, Serialize)]
pub struct Deleted {
    pub id: String,
    pub status: DeleteMode,
    pub revision: Revision,
}

#[derive(Debug, Clone, Serialize)]
pub struct Archived {
    pub id: String,
    pub kind: &'static str,
    pub reason: String,
    pub revision: Revision,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverdueItem {
    #[serde(flatten)]
    pub entry: OverdueEntry,
    pub status: Status,
    pub priority: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaleItem {
    #[serde(flatten)]
    pub entry: StaleEntry,
    pub status: Status,
}

// ---------------------------------------------------------------------------
// Backlog
// ---------------------------------------------------------------------------

pub struct BacklogService<'a> {
    store: &'a dyn ContentStore,
    index: Option<&'a dyn SearchIndex>,
}

impl<'a> BacklogService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ContentStore, index: Option<&'a dyn SearchIndex>) -> Self {
        Self { store, index }
    }

    fn index_upsert(&self, item: &BacklogItem) {
        let Some(index) = self.index else { return };
        if let Err(err) = index.upsert(&item.id, &item.search_text(), &index_metadata(item)) {
            warn!(id = %item.id, error = %err, "search index update failed; continuing");
        }
    }

    fn index_delete(&self, id: &str) {
        let Some(index) = self.index else { return };
        if let Err(err) = index.delete(id) {
            warn!(id, error = %err, "search index delete failed; continuing");
        }
    }

    /// # Errors
    ///
    /// Validation errors for bad input, store errors for failed writes.
    pub fn create(
        &self,
        new: NewItem,
        now: NaiveDateTime,
    ) -> Result<Created<BacklogItem>, DocketError> {
        let item = BacklogItem::create(new, now)?;
        validate_id("backlog", &item.id)?;
        let path = backlog_path(&item.id);
        let revision = self
            .store
            .create(&path, &codec::encode(&item), &format!("Add backlog: {}", item.title))
            .map_err(DocketError::Store)?;
        self.index_upsert(&item);
        info!(id = %item.id, title = %item.title, "created backlog item");
        Ok(Created {
            record: item,
            file_path: path,
            revision,
        })
    }

    /// # Errors
    ///
    /// [`DocketError::NotFound`] when no document exists for `id`.
    pub fn get(&self, id: &str, now: NaiveDateTime) -> Result<BacklogItem, DocketError> {
        validate_id("backlog", id)?;
        let text = self
            .store
            .read(&backlog_path(id))
            .map_err(|e| DocketError::from_store("backlog", id, e))?;
        Ok(codec::decode(&text, Some(id), now))
    }

    /// Apply `patch` and commit as `Update <title>: <change>, <change>`.
    ///
    /// # Errors
    ///
    /// Validation errors leave the stored document untouched.
    pub fn update(
        &self,
        id: &str,
        patch: ItemPatch,
        now: NaiveDateTime,
    ) -> Result<Updated, DocketError> {
        patch.validate()?;
        let mut item = self.get(id, now)?;
        let previous_status = item.status;
        let changes = item.apply(patch, now)?;

        let message = if changes.is_empty() {
            format!("Update {}", item.title)
        } else {
            format!("Update {}: {}", item.title, changes.join(", "))
        };
        let revision = self
            .store
            .update(&backlog_path(id), &codec::encode(&item), &message)
            .map_err(|e| DocketError::from_store("backlog", id, e))?;
        self.index_upsert(&item);
        info!(id, changes = changes.len(), "updated backlog item");

        Ok(Updated {
            item,
            previous_status,
            changes,
            revision,
        })
    }

    /// Status-only update, committed as `Update status of <title> to <status>`.
    ///
    /// # Errors
    ///
    /// [`DocketError::NotFound`] when no document exists for `id`.
    pub fn set_status(
        &self,
        id: &str,
        status: Status,
        now: NaiveDateTime,
    ) -> Result<Updated, DocketError> {
        let mut item = self.get(id, now)?;
        let previous_status = item.status;
        let changes = item.apply(ItemPatch::status_only(status), now)?;
        let revision = self
            .store
            .update(
                &backlog_path(id),
                &codec::encode(&item),
                &format!("Update status of {} to {status}", item.title),
            )
            .map_err(|e| DocketError::from_store("backlog", id, e))?;
        self.index_upsert(&item);
        info!(id, from = %previous_status, to = %status, "changed backlog status");

        Ok(Updated {
            item,
            previous_status,
            changes,
            revision,
        })
    }

    /// Delete an item. By default the document is archived (which removes
    /// the live copy); `permanent` removes it without an archived copy.
    ///
    /// # Errors
    ///
    /// [`DocketError::NotFound`] when no document exists for `id`.
    pub fn delete(&self, id: &str, permanent: bool) -> Result<Deleted, DocketError> {
        validate_id("backlog", id)?;
        let path = backlog_path(id);
        let (status, result) = if permanent {
            (
                DeleteMode::Deleted,
                self.store.delete(&path, &format!("Delete backlog {id}")),
            )
        } else {
            (
                DeleteMode::ArchivedAndDeleted,
                self.store.archive(&path, DELETE_ARCHIVE_REASON),
            )
        };
        let revision = result.map_err(|e| DocketError::from_store("backlog", id, e))?;
        self.index_delete(id);
        info!(id, permanent, "deleted backlog item");
        Ok(Deleted {
            id: id.to_string(),
            status,
            revision,
        })
    }

    /// # Errors
    ///
    /// [`DocketError::NotFound`] when no document exists for `id`.
    pub fn archive(&self, id: &str, reason: &str) -> Result<Archived, DocketError> {
        validate_id("backlog", id)?;
        let revision = self
            .store
            .archive(&backlog_path(id), reason)
            .map_err(|e| DocketError::from_store("backlog", id, e))?;
        self.index_delete(id);
        Ok(Archived {
            id: id.to_string(),
            kind: "backlog",
            reason: reason.to_string(),
            revision,
        })
    }

    /// Decode every live item, plus archived backlog documents when asked.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot list or read a document.
    pub fn load_all(
        &self,
        include_archived: bool,
        now: NaiveDateTime,
    ) -> Result<Vec<BacklogItem>, DocketError> {
        let mut items = Vec::new();
        for name in self.store.list(BACKLOG_DIR).map_err(DocketError::Store)? {
            let text = self
                .store
                .read(&store::join(BACKLOG_DIR, &name))
                .map_err(DocketError::Store)?;
            items.push(codec::decode(&text, Some(store::file_stem(&name)), now));
        }

        if include_archived {
            for name in self.store.list(ARCHIVE_DIR).map_err(DocketError::Store)? {
                let text = self
                    .store
                    .read(&store::join(ARCHIVE_DIR, &name))
                    .map_err(DocketError::Store)?;
                if looks_like_backlog(&text) {
                    let hint = store::file_stem(store::unarchived_name(&name));
                    items.push(codec::decode(&text, Some(hint), now));
                }
            }
        }

        debug!(count = items.len(), include_archived, "loaded backlog items");
        Ok(items)
    }

    /// Run a validated query over a fresh load of the collection.
    ///
    /// # Errors
    ///
    /// Fails only when the store cannot be read.
    pub fn query(
        &self,
        query: &AdvancedQuery,
        now: NaiveDateTime,
    ) -> Result<QueryPage, DocketError> {
        let items = self.load_all(query.include_archived, now)?;
        Ok(query.run(&items, now))
    }

    /// Open items past their due date.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be read.
    pub fn overdue(&self, now: NaiveDateTime) -> Result<Vec<OverdueItem>, DocketError> {
        let items = self.load_all(false, now)?;
        let entries = overdue_report(&items, now);
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let item = items.iter().find(|i| i.id == entry.id)?;
                Some(OverdueItem {
                    status: item.status,
                    priority: item.priority.get(),
                    entry,
                })
            })
            .collect())
    }

    /// Open items not updated for more than `threshold_days`.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be read.
    pub fn stale(
        &self,
        now: NaiveDateTime,
        threshold_days: i64,
    ) -> Result<Vec<StaleItem>, DocketError> {
        let items = self.load_all(false, now)?;
        let entries = stale_report(&items, now, threshold_days);
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let item = items.iter().find(|i| i.id == entry.id)?;
                Some(StaleItem {
                    status: item.status,
                    entry,
                })
            })
            .collect())
    }

    /// Ranked search over backlog documents.
    ///
    /// # Errors
    ///
    /// [`DocketError::SearchUnavailable`] when there is no index or it fails;
    /// a validation error when `k` is outside `1..=20`.
    pub fn search(&self, text: &str, k: usize) -> Result<Vec<SearchHit>, DocketError> {
        if !(1..=MAX_SEARCH_RESULTS).contains(&k) {
            return Err(ValidationError::new(
                "limit",
                format!("{k} is outside 1..={MAX_SEARCH_RESULTS}"),
            )
            .into());
        }
        let index = self
            .index
            .ok_or_else(|| DocketError::SearchUnavailable("search is disabled".into()))?;
        let mut filter = Metadata::new();
        filter.insert("type".into(), "backlog".into());
        index
            .query(text, k, &filter)
            .map_err(|e| DocketError::SearchUnavailable(format!("{e:#}")))
    }

    /// Rebuild the index from the store. Returns the number of documents
    /// indexed.
    ///
    /// # Errors
    ///
    /// [`DocketError::SearchUnavailable`] when there is no index or it fails.
    pub fn reindex(&self, now: NaiveDateTime) -> Result<usize, DocketError> {
        let index = self
            .index
            .ok_or_else(|| DocketError::SearchUnavailable("search is disabled".into()))?;
        let items = self.load_all(false, now)?;
        index
            .clear()
            .map_err(|e| DocketError::SearchUnavailable(format!("{e:#}")))?;
        for item in &items {
            index
                .upsert(&item.id, &item.search_text(), &index_metadata(item))
                .map_err(|e| DocketError::SearchUnavailable(format!("{e:#}")))?;
        }
        info!(count = items.len(), "rebuilt search index");
        Ok(items.len())
    }
}

// ---------------------------------------------------------------------------
// Meetings
// ---------------------------------------------------------------------------

pub struct MeetingService<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> MeetingService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }

    /// Write a meeting document. A meeting with the same date and title is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Validation errors for bad input, store errors for failed writes.
    pub fn create(
        &self,
        new: NewMeeting,
        now: NaiveDateTime,
    ) -> Result<Created<Meeting>, DocketError> {
        let meeting = Meeting::create(new, now)?;
        let path = store::join(MEETING_DIR, &meeting.filename());
        let revision = self
            .store
            .create(
                &path,
                &codec::meeting::encode(&meeting),
                &format!("Add meeting: {}", meeting.title),
            )
            .map_err(DocketError::Store)?;
        info!(id = %meeting.id, date = %dates::format_timestamp(meeting.date), "created meeting");
        Ok(Created {
            record: meeting,
            file_path: path,
            revision,
        })
    }

    /// # Errors
    ///
    /// [`DocketError::NotFound`] when no document exists for `id`.
    pub fn get(&self, id: &str, now: NaiveDateTime) -> Result<Meeting, DocketError> {
        validate_id("meeting", id)?;
        let id = store::file_stem(id);
        let text = self
            .store
            .read(&meeting_path(id))
            .map_err(|e| DocketError::from_store("meeting", id, e))?;
        Ok(codec::meeting::decode(&text, id, now))
    }

    /// Every meeting, newest first.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot list or read a document.
    pub fn list(&self, now: NaiveDateTime) -> Result<Vec<Meeting>, DocketError> {
        let mut meetings = Vec::new();
        for name in self.store.list(MEETING_DIR).map_err(DocketError::Store)? {
            let text = self
                .store
                .read(&store::join(MEETING_DIR, &name))
                .map_err(DocketError::Store)?;
            meetings.push(codec::meeting::decode(&text, store::file_stem(&name), now));
        }
        meetings.sort_by(meeting::newest_first);
        Ok(meetings)
    }

    /// # Errors
    ///
    /// [`DocketError::NotFound`] when no document exists for `id`.
    pub fn archive(&self, id: &str, reason: &str) -> Result<Archived, DocketError> {
        validate_id("meeting", id)?;
        let id = store::file_stem(id);
        let revision = self
            .store
            .archive(&meeting_path(id), reason)
            .map_err(|e| DocketError::from_store("meeting", id, e))?;
        Ok(Archived {
            id: id.to_string(),
            kind: "meeting",
            reason: reason.to_string(),
            revision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SearchIndex;
    use crate::model::item::Priority;
    use crate::query::QueryParams;
    use crate::store::MemoryStore;
    use anyhow::bail;
    use chrono::{Duration, NaiveDate};
    use std::cell::RefCell;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 15)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap()
    }

    fn new_item(title: &str) -> NewItem {
        NewItem {
            title: title.into(),
            ..NewItem::default()
        }
    }

    #[test]
    fn create_rejects_ids_that_escape_the_backlog_dir() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        for id in ["a/b", "..", ".hidden", "a\\b", "line\nbreak"] {
            let err = service
                .create(
                    NewItem {
                        id: Some(id.into()),
                        ..new_item("Sneaky")
                    },
                    now(),
                )
                .unwrap_err();
            assert!(
                matches!(err, DocketError::Validation(ref v) if v.field == "id"),
                "{id}: {err}"
            );
        }
        assert!(service.load_all(false, now()).unwrap().is_empty());

        let kept = service
            .create(
                NewItem {
                    id: Some("task-42".into()),
                    ..new_item("Named")
                },
                now(),
            )
            .unwrap();
        assert_eq!(kept.file_path, "backlogs/task-42.md");
        assert_eq!(service.get("task-42", now()).unwrap().title, "Named");
    }

    #[derive(Default)]
    struct FlakyIndex {
        fail: bool,
        docs: RefCell<Vec<(String, Metadata)>>,
    }

    impl SearchIndex for FlakyIndex {
        fn upsert(&self, id: &str, _text: &str, metadata: &Metadata) -> anyhow::Result<()> {
            if self.fail {
                bail!("index offline");
            }
            let mut docs = self.docs.borrow_mut();
            docs.retain(|(d, _)| d != id);
            docs.push((id.to_string(), metadata.clone()));
            Ok(())
        }

        fn delete(&self, id: &str) -> anyhow::Result<()> {
            if self.fail {
                bail!("index offline");
            }
            self.docs.borrow_mut().retain(|(d, _)| d != id);
            Ok(())
        }

        fn query(
            &self,
            _text: &str,
            k: usize,
            _filter: &Metadata,
        ) -> anyhow::Result<Vec<SearchHit>> {
            if self.fail {
                bail!("index offline");
            }
            Ok(self
                .docs
                .borrow()
                .iter()
                .take(k)
                .map(|(id, metadata)| SearchHit {
                    id: id.clone(),
                    document: String::new(),
                    metadata: metadata.clone(),
                    distance: 0.5,
                })
                .collect())
        }

        fn clear(&self) -> anyhow::Result<()> {
            self.docs.borrow_mut().clear();
            Ok(())
        }
    }

    #[test]
    fn create_then_get_roundtrips() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        let created = service.create(new_item("Write docs"), now()).unwrap();
        assert_eq!(created.file_path, format!("backlogs/{}.md", created.record.id));
        assert_eq!(store.messages(), ["Add backlog: Write docs"]);

        let loaded = service.get(&created.record.id, now()).unwrap();
        assert_eq!(loaded, created.record);
    }

    #[test]
    fn missing_item_is_not_found() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        let err = service.get("deadbeef", now()).unwrap_err();
        assert!(matches!(err, DocketError::NotFound { kind: "backlog", .. }));
        let err = service.delete("deadbeef", true).unwrap_err();
        assert!(matches!(err, DocketError::NotFound { .. }));
    }

    #[test]
    fn path_like_ids_are_rejected() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        let err = service.get("../secrets", now()).unwrap_err();
        assert!(matches!(err, DocketError::Validation(_)));
    }

    #[test]
    fn update_commit_message_lists_changes() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        let id = service.create(new_item("Old"), now()).unwrap().record.id;

        let later = now() + Duration::hours(2);
        let updated = service
            .update(
                &id,
                ItemPatch {
                    title: Some("New".into()),
                    priority: Some(1),
                    ..ItemPatch::default()
                },
                later,
            )
            .unwrap();
        assert_eq!(updated.item.updated_at, later);
        assert_eq!(updated.item.priority, Priority::HIGHEST);
        assert_eq!(
            store.messages()[1],
            "Update New: title from 'Old' to 'New', priority from 3 to 1"
        );
        assert_eq!(service.get(&id, later).unwrap().title, "New");
    }

    #[test]
    fn invalid_update_does_not_write() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        let id = service.create(new_item("Keep"), now()).unwrap().record.id;
        let err = service
            .update(
                &id,
                ItemPatch {
                    priority: Some(9),
                    ..ItemPatch::default()
                },
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, DocketError::Validation(_)));
        assert_eq!(store.messages().len(), 1);
    }

    #[test]
    fn status_to_done_sets_completed_at() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        let id = service.create(new_item("Ship"), now()).unwrap().record.id;
        let updated = service.set_status(&id, Status::Done, now()).unwrap();
        assert_eq!(updated.previous_status, Status::Todo);
        assert_eq!(updated.item.completed_at, Some(now()));
        assert_eq!(store.messages()[1], "Update status of Ship to done");
    }

    #[test]
    fn delete_archives_by_default() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        let id = service.create(new_item("Retire"), now()).unwrap().record.id;

        let deleted = service.delete(&id, false).unwrap();
        assert_eq!(deleted.status, DeleteMode::ArchivedAndDeleted);
        assert!(service.load_all(false, now()).unwrap().is_empty());

        let with_archived = service.load_all(true, now()).unwrap();
        assert_eq!(with_archived.len(), 1);
        assert_eq!(with_archived[0].id, id);
    }

    #[test]
    fn permanent_delete_leaves_no_copy() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        let id = service.create(new_item("Gone"), now()).unwrap().record.id;
        let deleted = service.delete(&id, true).unwrap();
        assert_eq!(deleted.status, DeleteMode::Deleted);
        assert!(service.load_all(true, now()).unwrap().is_empty());
    }

    #[test]
    fn archived_meetings_are_not_backlog_items() {
        let store = MemoryStore::new();
        let meetings = MeetingService::new(&store);
        let created = meetings
            .create(
                NewMeeting {
                    title: "Retro".into(),
                    ..NewMeeting::default()
                },
                now(),
            )
            .unwrap();
        meetings.archive(&created.record.id, "old").unwrap();
        let backlog = BacklogService::new(&store, None);
        assert!(backlog.load_all(true, now()).unwrap().is_empty());
    }

    #[test]
    fn index_failure_does_not_fail_writes() {
        let store = MemoryStore::new();
        let index = FlakyIndex {
            fail: true,
            ..FlakyIndex::default()
        };
        let service = BacklogService::new(&store, Some(&index));
        let id = service.create(new_item("Resilient"), now()).unwrap().record.id;
        service.set_status(&id, Status::Review, now()).unwrap();
        service.delete(&id, false).unwrap();

        assert!(matches!(
            service.search("resilient", 5),
            Err(DocketError::SearchUnavailable(_))
        ));
    }

    #[test]
    fn index_tracks_writes_and_reindex_rebuilds() {
        let store = MemoryStore::new();
        let index = FlakyIndex::default();
        let service = BacklogService::new(&store, Some(&index));
        let a = service.create(new_item("A"), now()).unwrap().record.id;
        let b = service.create(new_item("B"), now()).unwrap().record.id;
        service.delete(&a, true).unwrap();
        assert_eq!(index.docs.borrow().len(), 1);
        assert_eq!(index.docs.borrow()[0].1.get("type").map(String::as_str), Some("backlog"));

        index.docs.borrow_mut().clear();
        assert_eq!(service.reindex(now()).unwrap(), 1);
        let hits = service.search("b", 5).unwrap();
        assert_eq!(hits[0].id, b);
        assert!(matches!(
            service.search("b", 0),
            Err(DocketError::Validation(_))
        ));
    }

    #[test]
    fn search_without_index_is_unavailable() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        assert!(matches!(
            service.search("x", 5),
            Err(DocketError::SearchUnavailable(_))
        ));
    }

    #[test]
    fn query_reads_fresh_collection() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        for (title, priority) in [("low", 5), ("high", 1), ("mid", 3)] {
            service
                .create(
                    NewItem {
                        title: title.into(),
                        priority: Some(priority),
                        ..NewItem::default()
                    },
                    now(),
                )
                .unwrap();
        }
        let query = AdvancedQuery::try_from(QueryParams {
            sort_by: Some("priority".into()),
            sort_order: Some("asc".into()),
            limit: Some(2),
            ..QueryParams::default()
        })
        .unwrap();
        let page = service.query(&query, now()).unwrap();
        assert_eq!(page.total, 3);
        let titles: Vec<_> = page.results.iter().map(|v| v.item.title.as_str()).collect();
        assert_eq!(titles, ["high", "mid"]);
    }

    #[test]
    fn overdue_and_stale_lists() {
        let store = MemoryStore::new();
        let service = BacklogService::new(&store, None);
        let long_ago = now() - Duration::days(30);
        service
            .create(
                NewItem {
                    title: "Late".into(),
                    due_date: Some((now() - Duration::days(2)).date()),
                    ..NewItem::default()
                },
                long_ago,
            )
            .unwrap();
        service.create(new_item("Fresh"), now()).unwrap();

        let overdue = service.overdue(now()).unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].entry.title, "Late");
        assert_eq!(overdue[0].entry.days_overdue, 2);

        let stale = service.stale(now(), 7).unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].entry.days_stale, 30);
    }

    #[test]
    fn meetings_list_newest_first_and_get_by_stem() {
        let store = MemoryStore::new();
        let service = MeetingService::new(&store);
        for (title, days_ago) in [("Kickoff", 10), ("Review", 1)] {
            service
                .create(
                    NewMeeting {
                        title: title.into(),
                        date: Some(now() - Duration::days(days_ago)),
                        participants: vec!["Ari".into()],
                        ..NewMeeting::default()
                    },
                    now(),
                )
                .unwrap();
        }
        let listed = service.list(now()).unwrap();
        let titles: Vec<_> = listed.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, ["Review", "Kickoff"]);

        let first = &listed[0];
        let by_id = service.get(&first.id, now()).unwrap();
        assert_eq!(&by_id, first);
        let by_file = service.get(&format!("{}.md", first.id), now()).unwrap();
        assert_eq!(by_file.id, first.id);
        assert_eq!(store.messages()[0], "Add meeting: Kickoff");
    }
}
