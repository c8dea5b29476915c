//! GitStore against a real `git` binary in a temp directory.

use std::process::Command;

use chrono::{NaiveDate, NaiveDateTime};
use docket_core::model::{ItemPatch, NewItem, NewMeeting, Status};
use docket_core::service::{BacklogService, DeleteMode, MeetingService};
use docket_core::store::{ContentStore, GitIdentity, GitStore, StoreError};
use docket_core::DocketError;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 15)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap()
}

fn identity() -> GitIdentity {
    GitIdentity {
        name: "Test Bot".into(),
        email: "bot@test.local".into(),
    }
}

#[test]
fn open_requires_initialized_repository() {
    let dir = tempfile::tempdir().unwrap();
    let err = GitStore::open(dir.path(), identity()).unwrap_err();
    assert!(matches!(err, StoreError::NotInitialized { .. }));
}

#[test]
fn init_bootstraps_layout_once() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("repo");

    let (store, created) = GitStore::open_or_init(&root, identity()).unwrap();
    assert!(created);
    for sub in ["backlogs", "meetings", "archives"] {
        assert!(root.join(sub).join(".gitkeep").exists(), "{sub} missing");
    }
    assert!(root.join("README.md").exists());
    let history = store.history("README.md", 5).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message, "Initial repository structure");
    assert_eq!(history[0].author, "Test Bot");

    let (_, created_again) = GitStore::open_or_init(&root, identity()).unwrap();
    assert!(!created_again);
    assert!(store.list("backlogs").unwrap().is_empty());
}

#[test]
fn backlog_lifecycle_is_committed() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = GitStore::open_or_init(dir.path(), identity()).unwrap();
    let service = BacklogService::new(&store, None);

    let created = service
        .create(
            NewItem {
                title: "Wire up webhooks".into(),
                description: "Slack first.".into(),
                tags: vec!["notify".into()],
                ..NewItem::default()
            },
            now(),
        )
        .unwrap();
    let id = created.record.id.clone();
    assert_eq!(created.revision.as_str().len(), 40);

    service
        .update(
            &id,
            ItemPatch {
                assignee: Some("Kim".into()),
                ..ItemPatch::default()
            },
            now(),
        )
        .unwrap();
    service.set_status(&id, Status::InProgress, now()).unwrap();

    let path = format!("backlogs/{id}.md");
    let messages: Vec<String> = store
        .history(&path, 10)
        .unwrap()
        .into_iter()
        .map(|h| h.message)
        .collect();
    assert_eq!(
        messages,
        [
            "Update status of Wire up webhooks to in_progress".to_string(),
            "Update Wire up webhooks: assignee from 'none' to 'Kim'".to_string(),
            "Add backlog: Wire up webhooks".to_string(),
        ]
    );

    let loaded = service.get(&id, now()).unwrap();
    assert_eq!(loaded.assignee.as_deref(), Some("Kim"));
    assert_eq!(loaded.status, Status::InProgress);

    let deleted = service.delete(&id, false).unwrap();
    assert_eq!(deleted.status, DeleteMode::ArchivedAndDeleted);
    assert!(!dir.path().join(&path).exists());
    let archived = store.list("archives").unwrap();
    assert_eq!(archived.len(), 1);
    assert!(archived[0].ends_with(&format!("_{id}.md")));
    let text = store.read(&format!("archives/{}", archived[0])).unwrap();
    assert!(text.starts_with("<!-- Archived: Archived before deletion -->"));

    let everything = service.load_all(true, now()).unwrap();
    assert_eq!(everything.len(), 1);
    assert_eq!(everything[0].id, id);

    assert!(matches!(
        service.get(&id, now()),
        Err(DocketError::NotFound { .. })
    ));
}

#[test]
fn meetings_are_stored_by_date_and_slug() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = GitStore::open_or_init(dir.path(), identity()).unwrap();
    let service = MeetingService::new(&store);

    let created = service
        .create(
            NewMeeting {
                title: "Sprint Planning".into(),
                date: Some(now()),
                participants: vec!["Ari".into(), "Kim".into()],
                action_items: vec!["Book room".into()],
                ..NewMeeting::default()
            },
            now(),
        )
        .unwrap();
    assert_eq!(created.file_path, "meetings/2024-05-15-sprint-planning.md");
    assert!(dir.path().join(&created.file_path).exists());

    let listed = service.list(now()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].participants, ["Ari", "Kim"]);
    assert_eq!(listed[0].action_items, ["Book room"]);
}

#[test]
fn traversal_paths_are_rejected() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = GitStore::open_or_init(dir.path(), identity()).unwrap();
    let err = store.create("../escape.md", "x", "nope").unwrap_err();
    assert!(matches!(err, StoreError::InvalidPath { .. }));
}

#[test]
fn sync_without_remote_is_a_noop() {
    if !git_available() {
        eprintln!("skipping: git not installed");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let (store, _) = GitStore::open_or_init(dir.path(), identity()).unwrap();
    assert!(!store.pull().unwrap());
    assert!(!store.push().unwrap());
}
