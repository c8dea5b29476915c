use chrono::NaiveDate;
use docket_core::index::{Metadata, SearchIndex};
use docket_core::model::NewItem;
use docket_core::service::BacklogService;
use docket_core::store::MemoryStore;
use docket_search::SqliteIndex;

fn meta(pairs: &[(&str, &str)]) -> Metadata {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn seeded() -> SqliteIndex {
    let index = SqliteIndex::open_in_memory().unwrap();
    index
        .upsert(
            "a1",
            "Login redirect broken\nUsers land on the wrong page after login",
            &meta(&[("type", "backlog"), ("status", "todo")]),
        )
        .unwrap();
    index
        .upsert(
            "b2",
            "Dashboard charts\nRender weekly login totals",
            &meta(&[("type", "backlog"), ("status", "done")]),
        )
        .unwrap();
    index
        .upsert(
            "m3",
            "Planning meeting\nDiscussed login work",
            &meta(&[("type", "meeting")]),
        )
        .unwrap();
    index
}

#[test]
fn results_are_ranked_by_ascending_distance() {
    let index = seeded();
    let hits = index.query("login redirect", 10, &Metadata::new()).unwrap();
    assert_eq!(hits[0].id, "a1");
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    assert!(hits.iter().all(|h| h.distance > 0.0 && h.distance <= 1.0));
}

#[test]
fn metadata_filter_excludes_other_types() {
    let index = seeded();
    let hits = index.query("login", 10, &meta(&[("type", "backlog")])).unwrap();
    let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&"m3"));
}

#[test]
fn k_caps_the_result_count() {
    let index = seeded();
    assert_eq!(index.query("login", 1, &Metadata::new()).unwrap().len(), 1);
    assert!(index.query("login", 0, &Metadata::new()).unwrap().is_empty());
}

#[test]
fn upsert_replaces_previous_text() {
    let index = seeded();
    index
        .upsert("a1", "Completely different words", &meta(&[("type", "backlog")]))
        .unwrap();
    assert_eq!(index.len().unwrap(), 3);
    let hits = index.query("redirect", 10, &Metadata::new()).unwrap();
    assert!(hits.is_empty());
    let (body, metadata) = index.get("a1").unwrap().unwrap();
    assert_eq!(body, "Completely different words");
    assert_eq!(metadata.get("status"), None);
}

#[test]
fn delete_and_clear() {
    let index = seeded();
    index.delete("b2").unwrap();
    index.delete("never-there").unwrap();
    assert_eq!(index.len().unwrap(), 2);
    assert!(index.get("b2").unwrap().is_none());

    index.clear().unwrap();
    assert!(index.is_empty().unwrap());
    assert!(index.query("login", 5, &Metadata::new()).unwrap().is_empty());
}

#[test]
fn punctuation_only_queries_return_nothing() {
    let index = seeded();
    assert!(index.query("\"*(", 5, &Metadata::new()).unwrap().is_empty());
    assert!(!index.query("login)", 5, &Metadata::new()).unwrap().is_empty());
}

#[test]
fn stemming_matches_word_forms() {
    let index = seeded();
    let hits = index.query("rendering", 5, &Metadata::new()).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "b2");
}

#[test]
fn on_disk_index_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("search.db");
    {
        let index = SqliteIndex::open(&path).unwrap();
        index
            .upsert("x1", "persisted document", &Metadata::new())
            .unwrap();
    }
    let reopened = SqliteIndex::open(&path).unwrap();
    assert_eq!(reopened.len().unwrap(), 1);
    assert_eq!(
        reopened.query("persisted", 5, &Metadata::new()).unwrap()[0].id,
        "x1"
    );
}

#[test]
fn backlog_service_searches_through_sqlite() {
    let store = MemoryStore::new();
    let index = SqliteIndex::open_in_memory().unwrap();
    let service = BacklogService::new(&store, Some(&index));
    let now = NaiveDate::from_ymd_opt(2024, 5, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap();

    let created = service
        .create(
            NewItem {
                title: "Rotate API keys".into(),
                description: "Quarterly credential rotation".into(),
                assignee: Some("Kim".into()),
                ..NewItem::default()
            },
            now,
        )
        .unwrap();
    service
        .create(
            NewItem {
                title: "Update onboarding doc".into(),
                ..NewItem::default()
            },
            now,
        )
        .unwrap();

    let hits = service.search("credential", 5).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, created.record.id);
    assert_eq!(hits[0].metadata.get("assignee").map(String::as_str), Some("Kim"));
    assert_eq!(hits[0].metadata.get("status").map(String::as_str), Some("todo"));

    index.clear().unwrap();
    assert!(service.search("credential", 5).unwrap().is_empty());
    assert_eq!(service.reindex(now).unwrap(), 2);
    assert_eq!(service.search("credential", 5).unwrap().len(), 1);

    service.delete(&created.record.id, false).unwrap();
    assert!(service.search("credential", 5).unwrap().is_empty());
}
