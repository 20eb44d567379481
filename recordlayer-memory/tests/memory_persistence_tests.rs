/// Record store tests
///
/// Tests for the generic in-memory store: paging pipeline, lifecycle, save gating and
/// concurrent access
/// Run with: cargo test --test memory_persistence_tests

mod common;

use common::{Dummy, RecordingPersister, dummies, fields};
use recordlayer_core::{
    config::{ConfigParams, MAX_PAGE_SIZE_KEY},
    error::PersistenceError,
    page::PagingParams,
    query::{Filter, Query, SortDirection},
};
use recordlayer_memory::{FilterFn, MemoryPersistence};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

async fn loaded_store(count: usize) -> (MemoryPersistence<Dummy>, RecordingPersister) {
    let persister = RecordingPersister::with_items(dummies(count));
    let store = MemoryPersistence::<Dummy>::builder()
        .with_persister(persister.clone())
        .build();

    store.open(None).await.unwrap();

    (store, persister)
}

fn keys(items: &[Dummy]) -> Vec<&str> {
    items.iter().map(|item| item.key.as_str()).collect()
}

#[tokio::test]
async fn test_create_and_page_without_filter() {
    let store = MemoryPersistence::<Dummy>::new();

    store.create(None, Dummy::new("Key 1", "Content 1")).await.unwrap();
    store.create(None, Dummy::new("Key 1", "Content 1")).await.unwrap();

    let page = store.get_page_by_filter(None, None, None, None, None).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn test_filter_sort_then_page() {
    let (store, _) = loaded_store(10).await;

    let page = store
        .get_page_by_filter(
            Some("trace-1"),
            Some(&|d: &Dummy| d.key != "Key 10"),
            Some(PagingParams::builder().with_skip(2).with_take(3).build()),
            Some(&|a: &Dummy, b: &Dummy| b.key.cmp(&a.key)),
            None,
        )
        .await
        .unwrap();

    assert_eq!(page.total, 9);
    assert_eq!(keys(&page.items), vec!["Key 7", "Key 6", "Key 5"]);
}

#[tokio::test]
async fn test_page_never_exceeds_take_and_total_matches_count() {
    let (store, _) = loaded_store(12).await;

    let ends_with_one = |d: &Dummy| d.key.ends_with('1');
    let no_content = |d: &Dummy| d.content.is_empty();
    let filters: [Option<FilterFn<'_, Dummy>>; 3] = [None, Some(&ends_with_one), Some(&no_content)];

    for filter in filters {
        let count = store.get_count_by_filter(None, filter).await.unwrap();

        for take in [1, 2, 5, 20] {
            let page = store
                .get_page_by_filter(None, filter, Some(PagingParams::new(None, Some(take))), None, None)
                .await
                .unwrap();

            assert!(page.items.len() <= take as usize, "page larger than take {take}");
            assert_eq!(page.total, count);
        }
    }
}

#[tokio::test]
async fn test_page_size_clamp_and_unlimited_take() {
    let store = MemoryPersistence::<Dummy>::builder()
        .with_saver(RecordingPersister::new())
        .with_max_page_size(5)
        .build();

    for item in dummies(12) {
        store.create(None, item).await.unwrap();
    }

    let default_page = store.get_page_by_filter(None, None, None, None, None).await.unwrap();
    assert_eq!(default_page.items.len(), 5);
    assert_eq!(default_page.total, 12);

    let clamped = store
        .get_page_by_filter(None, None, Some(PagingParams::new(None, Some(50))), None, None)
        .await
        .unwrap();
    assert_eq!(clamped.items.len(), 5);

    for take in [0, -3] {
        let unlimited = store
            .get_page_by_filter(None, None, Some(PagingParams::new(Some(-4), Some(take))), None, None)
            .await
            .unwrap();
        assert_eq!(unlimited.items.len(), 12);
        assert_eq!(unlimited.items[0].key, "Key 1");
    }
}

#[tokio::test]
async fn test_select_runs_on_page_only() {
    let (store, _) = loaded_store(4).await;

    let page = store
        .get_page_by_filter(
            None,
            None,
            Some(PagingParams::new(Some(1), Some(2))),
            None,
            Some(&|mut d: Dummy| {
                d.content = d.content.to_uppercase();
                d
            }),
        )
        .await
        .unwrap();

    assert_eq!(page.total, 4);
    assert_eq!(
        page.items.iter().map(|d| d.content.as_str()).collect::<Vec<_>>(),
        vec!["CONTENT 2", "CONTENT 3"]
    );

    let list = store.get_list_by_filter(None, None, None, None).await.unwrap();
    assert_eq!(list[1].content, "Content 2");
}

#[tokio::test]
async fn test_list_and_count_by_filter() {
    let (store, _) = loaded_store(10).await;

    let list = store
        .get_list_by_filter(
            None,
            Some(&|d: &Dummy| d.key.len() == 5),
            Some(&|a: &Dummy, b: &Dummy| b.key.cmp(&a.key)),
            None,
        )
        .await
        .unwrap();

    assert_eq!(list.len(), 9);
    assert_eq!(list[0].key, "Key 9");

    let count = store
        .get_count_by_filter(None, Some(&|d: &Dummy| d.key.len() == 6))
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_repeated_queries_are_deterministic() {
    let (store, _) = loaded_store(10).await;
    let filter = |d: &Dummy| d.key != "Key 3";
    let sort = |a: &Dummy, b: &Dummy| a.content.len().cmp(&b.content.len());

    let first = store.get_list_by_filter(None, Some(&filter), Some(&sort), None).await.unwrap();
    let second = store.get_list_by_filter(None, Some(&filter), Some(&sort), None).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_returned_records_are_copies() {
    let (store, _) = loaded_store(2).await;

    let mut list = store.get_list_by_filter(None, None, None, None).await.unwrap();
    list[0].content = "tampered".to_string();
    list.clear();

    let fresh = store.get_list_by_filter(None, None, None, None).await.unwrap();
    assert_eq!(fresh.len(), 2);
    assert_eq!(fresh[0].content, "Content 1");
}

#[tokio::test]
async fn test_random_pick_stays_in_filtered_subset() {
    let (store, _) = loaded_store(10).await;

    for _ in 0..50 {
        let only = store
            .get_one_random(None, Some(&|d: &Dummy| d.key == "Key 7"))
            .await
            .unwrap();
        assert_eq!(only.map(|d| d.key), Some("Key 7".to_string()));

        let odd = store
            .get_one_random(None, Some(&|d: &Dummy| d.id.as_deref().is_some_and(|id| id.ends_with(['1', '3', '5', '7', '9']))))
            .await
            .unwrap()
            .unwrap();
        assert!(["1", "3", "5", "7", "9"].contains(&odd.id.as_deref().unwrap()));
    }

    let none = store
        .get_one_random(None, Some(&|d: &Dummy| d.key == "missing"))
        .await
        .unwrap();
    assert!(none.is_none());

    let empty = MemoryPersistence::<Dummy>::new();
    assert!(empty.get_one_random(None, None).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_by_filter_saves_only_when_something_was_removed() {
    let (store, persister) = loaded_store(5).await;

    let deleted = store
        .delete_by_filter(None, &|d: &Dummy| d.key == "missing")
        .await
        .unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(persister.save_count(), 0);

    let deleted = store
        .delete_by_filter(None, &|d: &Dummy| d.key == "Key 2" || d.key == "Key 4")
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(persister.save_count(), 1);
    assert_eq!(keys(&persister.saved()), vec!["Key 1", "Key 3", "Key 5"]);
}

#[tokio::test]
async fn test_panicking_delete_filter_leaves_collection_intact() {
    let (store, persister) = loaded_store(5).await;

    let task_store = store.clone();
    let handle = tokio::spawn(async move {
        let calls = AtomicUsize::new(0);
        let failing = |_: &Dummy| {
            if calls.fetch_add(1, Ordering::SeqCst) == 3 {
                panic!("filter failed on the fourth record");
            }
            true
        };

        task_store.delete_by_filter(None, &failing).await
    });

    assert!(handle.await.is_err());
    assert_eq!(store.get_count_by_filter(None, None).await.unwrap(), 5);
    assert_eq!(persister.save_count(), 0);

    let deleted = store
        .delete_by_filter(None, &|d: &Dummy| d.key == "Key 1")
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(persister.save_count(), 1);
}

#[tokio::test]
async fn test_read_callbacks_run_without_the_lock() {
    let (store, _) = loaded_store(3).await;

    // Each callback reads the store again from another thread; holding the lock here would
    // deadlock.
    let observer = store.clone();
    let reenter = move || {
        std::thread::scope(|scope| {
            scope
                .spawn(|| futures::executor::block_on(observer.get_count_by_filter(None, None)))
                .join()
                .unwrap()
                .unwrap()
        })
    };

    let filter = |d: &Dummy| reenter() == 3 && d.key != "Key 2";
    let sort = |a: &Dummy, b: &Dummy| {
        assert_eq!(reenter(), 3);
        b.key.cmp(&a.key)
    };
    let select = |mut d: Dummy| {
        d.content = format!("{} of {}", d.content, reenter());
        d
    };

    let count = store.get_count_by_filter(None, Some(&filter)).await.unwrap();
    assert_eq!(count, 2);

    let page = store
        .get_page_by_filter(None, Some(&filter), None, Some(&sort), Some(&select))
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(keys(&page.items), vec!["Key 3", "Key 1"]);
    assert_eq!(page.items[0].content, "Content 3 of 3");

    let random = store.get_one_random(None, Some(&filter)).await.unwrap();
    assert!(random.is_some_and(|d| d.key != "Key 2"));
}

#[tokio::test]
async fn test_open_loads_once_and_close_saves_once() {
    let persister = RecordingPersister::with_items(dummies(3));
    let store = MemoryPersistence::<Dummy>::builder()
        .with_persister(persister.clone())
        .build();

    assert!(!store.is_open());
    store.open(None).await.unwrap();
    store.open(None).await.unwrap();

    assert!(store.is_open());
    assert_eq!(persister.load_count(), 1);
    assert_eq!(store.get_count_by_filter(None, None).await.unwrap(), 3);

    store.close(Some("shutdown")).await.unwrap();

    assert!(!store.is_open());
    assert_eq!(persister.save_count(), 1);
    assert_eq!(persister.saved(), dummies(3));
}

#[tokio::test]
async fn test_open_failure_leaves_store_closed() {
    let persister = RecordingPersister::with_items(dummies(3));
    persister.fail_loads(true);

    let store = MemoryPersistence::<Dummy>::builder()
        .with_loader(persister.clone())
        .build();

    let result = store.open(None).await;

    assert!(matches!(result, Err(PersistenceError::Io(_))));
    assert!(!store.is_open());
}

#[tokio::test]
async fn test_load_failure_preserves_collection() {
    let (store, persister) = loaded_store(3).await;

    persister.set_items(dummies(8));
    persister.fail_loads(true);

    assert!(matches!(store.load(None).await, Err(PersistenceError::Io(_))));
    assert_eq!(store.get_count_by_filter(None, None).await.unwrap(), 3);

    persister.fail_loads(false);
    store.load(None).await.unwrap();
    assert_eq!(store.get_count_by_filter(None, None).await.unwrap(), 8);
}

#[tokio::test]
async fn test_save_failure_surfaces_from_mutation() {
    let persister = RecordingPersister::new();
    let store = MemoryPersistence::<Dummy>::builder()
        .with_saver(persister.clone())
        .build();

    persister.fail_saves(true);
    let result = store.create(None, Dummy::new("Key 1", "Content 1")).await;

    assert!(matches!(result, Err(PersistenceError::Io(_))));
    assert_eq!(store.get_count_by_filter(None, None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_close_marks_closed_even_when_save_fails() {
    let (store, persister) = loaded_store(1).await;
    persister.fail_saves(true);

    assert!(store.close(None).await.is_err());
    assert!(!store.is_open());
}

#[tokio::test]
async fn test_clear_empties_and_saves() {
    let (store, persister) = loaded_store(3).await;

    store.clear(None).await.unwrap();

    assert_eq!(store.get_count_by_filter(None, None).await.unwrap(), 0);
    assert_eq!(persister.save_count(), 1);
    assert!(persister.saved().is_empty());
}

#[tokio::test]
async fn test_configure_page_size() {
    let store = MemoryPersistence::<Dummy>::new();
    assert_eq!(store.max_page_size(), 100);

    store
        .configure(&ConfigParams::from_value(json!({ "options": { "max_page_size": 7 } })).unwrap())
        .unwrap();
    assert_eq!(store.max_page_size(), 7);

    store
        .configure(&ConfigParams::from_tuples([(MAX_PAGE_SIZE_KEY, "9")]))
        .unwrap();
    assert_eq!(store.max_page_size(), 9);

    let negative = store.configure(&ConfigParams::from_tuples([(MAX_PAGE_SIZE_KEY, -1)]));
    assert!(matches!(negative, Err(PersistenceError::Configuration(_))));
    assert_eq!(store.max_page_size(), 9);

    store.configure(&ConfigParams::new()).unwrap();
    assert_eq!(store.max_page_size(), 9);
}

#[tokio::test]
async fn test_create_from_fields() {
    let store = MemoryPersistence::<Dummy>::new();

    let created = store
        .create_from_fields(None, fields(json!({ "key": "Key 1", "content": "Content 1" })))
        .await
        .unwrap();
    assert_eq!(created, Dummy::new("Key 1", "Content 1"));

    let invalid = store.create_from_fields(None, fields(json!({ "key": 5 }))).await;
    assert!(matches!(invalid, Err(PersistenceError::Serialization(_))));
    assert_eq!(store.get_count_by_filter(None, None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_structured_query() {
    let (store, _) = loaded_store(5).await;

    let query = Query::builder()
        .filter(Filter::any_of("key", vec!["Key 1", "Key 3", "Key 5"]))
        .sort("key", SortDirection::Desc)
        .build();

    let page = store
        .get_page_by_query(None, Some(query.clone()), Some(PagingParams::new(None, Some(2))))
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(keys(&page.items), vec!["Key 5", "Key 3"]);

    let list = store.get_list_by_query(None, Some(query)).await.unwrap();
    assert_eq!(keys(&list), vec!["Key 5", "Key 3", "Key 1"]);

    let everything = store.get_list_by_query(None, None).await.unwrap();
    assert_eq!(everything.len(), 5);

    let drafts = store
        .get_list_by_query(
            None,
            Some(Query::builder().filter(Filter::starts_with("content", "Draft")).build()),
        )
        .await
        .unwrap();
    assert!(drafts.is_empty());
}

#[tokio::test]
async fn test_concurrent_creates() {
    let persister = RecordingPersister::new();
    let store = MemoryPersistence::<Dummy>::builder()
        .with_saver(persister.clone())
        .build();

    let num_tasks = 8;
    let creates_per_task = 25;
    let mut handles = vec![];

    for task_id in 0..num_tasks {
        let store = store.clone();

        handles.push(tokio::spawn(async move {
            for i in 0..creates_per_task {
                store
                    .create(None, Dummy::new(&format!("Key {task_id}-{i}"), "Concurrent"))
                    .await
                    .unwrap();
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let total = num_tasks * creates_per_task;
    assert_eq!(store.get_count_by_filter(None, None).await.unwrap(), total);
    assert_eq!(persister.save_count(), total);
    assert_eq!(persister.saved().len(), total);
}
