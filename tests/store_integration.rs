//! Integration tests for the SQLite-backed clip store

use std::sync::Arc;

use clipshelf::clip::ClipRecord;
use clipshelf::store::{ClipStore, KeyValueStorage, SqliteStorage, UpsertOutcome, UpsertPolicy, CLIPS_KEY};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

fn open_store(temp_dir: &TempDir) -> ClipStore<SqliteStorage> {
    let storage = SqliteStorage::open(&temp_dir.path().join("clips.db")).unwrap();
    ClipStore::new(storage)
}

#[tokio::test]
async fn test_load_empty_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    assert!(store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_saving_same_pair_twice_keeps_one_record() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    store
        .upsert(ClipRecord::new("first", "https://other.com/", None, 1))
        .await
        .unwrap();
    let first = store
        .upsert(ClipRecord::new("quote", "https://www.example.com/a", None, 2))
        .await
        .unwrap();
    store
        .upsert(ClipRecord::new("last", "https://third.com/", None, 3))
        .await
        .unwrap();

    let second = store
        .upsert(ClipRecord::new(
            "quote",
            "https://example.com/b",
            Some("https://example.com/icon.png".into()),
            4,
        ))
        .await
        .unwrap();

    assert!(matches!(first, UpsertOutcome::Inserted { .. }));
    assert_eq!(second, UpsertOutcome::Updated { id: first.id(), index: 1 });

    let clips = store.load().await.unwrap();
    let texts: Vec<&str> = clips.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["last", "quote", "first"]);

    let quote = &clips[1];
    assert_eq!(quote.id, first.id());
    assert_eq!(quote.timestamp, 4);
    assert_eq!(quote.favicon(), Some("https://example.com/icon.png"));
}

#[tokio::test]
async fn test_move_to_front_policy() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir).with_policy(UpsertPolicy::MoveToFront);

    store.upsert(ClipRecord::new("a", "https://a.com", None, 1)).await.unwrap();
    store.upsert(ClipRecord::new("b", "https://b.com", None, 2)).await.unwrap();
    let outcome = store.upsert(ClipRecord::new("a", "https://a.com", None, 3)).await.unwrap();

    assert!(matches!(outcome, UpsertOutcome::Updated { index: 0, .. }));
    let clips = store.load().await.unwrap();
    assert_eq!(clips[0].text, "a");
    assert_eq!(clips[0].timestamp, 3);
    assert_eq!(clips.len(), 2);
}

#[tokio::test]
async fn test_distinct_pairs_are_all_kept() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    for i in 0..12 {
        let url = format!("https://site{}.com/", i % 3);
        store
            .upsert(ClipRecord::new(format!("clip {}", i), url, None, i))
            .await
            .unwrap();
    }

    let clips = store.load().await.unwrap();
    assert_eq!(clips.len(), 12);
    assert_eq!(clips[0].text, "clip 11");
    assert_eq!(clips[11].text, "clip 0");
}

#[tokio::test]
async fn test_clips_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let store = open_store(&temp_dir);
        store
            .upsert(ClipRecord::new("persisted", "https://example.com", None, 7))
            .await
            .unwrap();
    }

    let store = open_store(&temp_dir);
    let clips = store.load().await.unwrap();
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0].text, "persisted");
}

#[tokio::test]
async fn test_clear_empties_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = open_store(&temp_dir);

    for i in 0..5 {
        store
            .upsert(ClipRecord::new(format!("clip {}", i), "https://example.com", None, i))
            .await
            .unwrap();
    }

    store.clear().await.unwrap();
    assert!(store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_loads_records_written_without_ids() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    storage
        .set(
            CLIPS_KEY,
            json!([
                {"text": "one", "url": "https://a.com/", "domain": "a.com", "favicon": null, "timestamp": 1},
                {"text": "two", "url": "https://b.com/", "domain": "b.com", "favicon": "", "timestamp": 2}
            ]),
        )
        .await
        .unwrap();

    let store = ClipStore::new(Arc::clone(&storage));
    let clips = store.load().await.unwrap();
    assert_eq!(clips.len(), 2);
    assert_ne!(clips[0].id, clips[1].id);
    assert_eq!(clips[1].favicon(), None);

    // Re-saving a legacy record keeps the id it was given on load
    store.save(&clips).await.unwrap();
    let outcome = store.upsert(ClipRecord::new("one", "https://a.com/x", None, 9)).await.unwrap();
    assert_eq!(outcome.id(), clips[0].id);
}

#[tokio::test]
async fn test_concurrent_upserts_through_one_handle() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(open_store(&temp_dir));

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .upsert(ClipRecord::new(format!("clip {}", i), "https://example.com", None, i))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.load().await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_corrupt_value_is_an_error() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    storage.set(CLIPS_KEY, json!({"not": "a list"})).await.unwrap();

    let store = ClipStore::new(storage);
    assert!(store.load().await.is_err());
}
