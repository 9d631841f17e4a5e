//! Cursor and class-level query tests against the in-memory backend.

use std::sync::atomic::{AtomicUsize, Ordering};

use docmap::memory::MemoryStore;
use docmap::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Fields)]
struct Profile {
    name: Option<String>,
    age: Option<i32>,
}

impl Model for Profile {}

static WIDGET_DESTROYS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, Default, Serialize, Deserialize, Fields)]
struct Widget {
    name: Option<String>,
}

impl Model for Widget {
    fn install(hooks: &mut Hooks<Self>) {
        hooks.after_destroy(|_| {
            WIDGET_DESTROYS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    }
}

fn setup() -> MemoryStore {
    let _ = env_logger::builder().is_test(true).try_init();
    MemoryStore::new()
}

async fn seed(store: &MemoryStore, entries: &[(&str, i32)]) {
    for (name, age) in entries {
        Profile::create(
            store,
            Profile {
                name: Some((*name).into()),
                age: Some(*age),
            },
        )
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn chained_find_merges_filters() {
    let store = setup();
    seed(&store, &[("p1", 40), ("p2", 40), ("p3", 30)]).await;

    let by_age = Profile::find(&store, doc! { "age": 40 });
    assert_eq!(by_age.count().await.unwrap(), 2);

    // Narrowing by another key keeps the earlier constraint.
    assert_eq!(
        by_age.find(doc! { "name": "p1" }).count().await.unwrap(),
        1
    );

    // A colliding key overwrites the earlier value.
    let rebound = Profile::find(&store, doc! { "age": 40 }).find(doc! { "age": 30 });
    assert_eq!(rebound.count().await.unwrap(), 1);
}

#[tokio::test]
async fn sort_skip_and_limit_shape_the_result() {
    let store = setup();
    seed(&store, &[("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)]).await;

    let records = Profile::query(&store)
        .sort(doc! { "age": -1 })
        .skip(1)
        .limit(2)
        .all()
        .await
        .unwrap();

    let ages: Vec<i32> = records.iter().filter_map(|r| r.age).collect();
    assert_eq!(ages, vec![4, 3]);
}

#[tokio::test]
async fn find_with_merges_filter_and_options_together() {
    let store = setup();
    seed(&store, &[("a", 1), ("b", 2), ("c", 3)]).await;

    let options = QueryOptions {
        limit: Some(1),
        skip: None,
        sort: Some(doc! { "age": -1 }),
    };
    let records = Profile::query(&store)
        .find_with(doc! { "age": { "$gte": 2 } }, options)
        .all()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name.as_deref(), Some("c"));
}

#[tokio::test]
async fn count_respects_skip_and_limit() {
    let store = setup();
    seed(&store, &[("a", 1), ("b", 2), ("c", 3)]).await;

    assert_eq!(Profile::query(&store).count().await.unwrap(), 3);
    assert_eq!(Profile::query(&store).skip(2).count().await.unwrap(), 1);
    assert_eq!(Profile::query(&store).limit(2).count().await.unwrap(), 2);
}

#[tokio::test]
async fn first_follows_store_order() {
    let store = setup();
    seed(&store, &[("p1", 40), ("p2", 30)]).await;

    let first = Profile::first(&store).await.unwrap().unwrap();
    assert_eq!(first.name.as_deref(), Some("p1"));

    let youngest = Profile::query(&store)
        .sort(doc! { "age": 1 })
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(youngest.name.as_deref(), Some("p2"));

    assert!(
        Profile::find(&store, doc! { "name": "p9" })
            .first()
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn find_by_id_tolerates_malformed_input() {
    let store = setup();
    let record = Profile::create(
        &store,
        Profile {
            name: Some("p1".into()),
            age: Some(40),
        },
    )
    .await
    .unwrap();
    let id = record.id().unwrap();

    assert!(Profile::find_by_id(&store, &id).await.unwrap().is_some());
    assert!(
        Profile::find_by_id(&store, "not-an-object-id")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        Profile::find_by_id(&store, &ObjectId::new().to_hex())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn destroy_by_id_reports_outcome() {
    let store = setup();
    let record = Profile::create(
        &store,
        Profile {
            name: Some("p1".into()),
            age: Some(40),
        },
    )
    .await
    .unwrap();
    let id = record.id().unwrap();

    assert!(!Profile::destroy_by_id(&store, "garbage").await.unwrap());
    assert_eq!(Profile::count(&store).await.unwrap(), 1);

    assert!(Profile::destroy_by_id(&store, &id).await.unwrap());
    assert_eq!(Profile::count(&store).await.unwrap(), 0);
    assert!(!Profile::destroy_by_id(&store, &id).await.unwrap());
}

#[tokio::test]
async fn cursor_destroy_all_runs_hooks_class_level_does_not() {
    let store = setup();
    for name in ["w1", "w2", "w3"] {
        Widget::create(
            &store,
            Widget {
                name: Some(name.into()),
            },
        )
        .await
        .unwrap();
    }

    let destroys_before = WIDGET_DESTROYS.load(Ordering::SeqCst);
    let outcomes = Widget::find(&store, doc! { "name": { "$ne": "w3" } })
        .destroy_all()
        .await
        .unwrap();
    assert_eq!(outcomes, vec![true, true]);
    assert_eq!(
        WIDGET_DESTROYS.load(Ordering::SeqCst),
        destroys_before + 2
    );

    let bulk_before = WIDGET_DESTROYS.load(Ordering::SeqCst);
    assert_eq!(Widget::destroy_all(&store).await.unwrap(), 1);
    assert_eq!(WIDGET_DESTROYS.load(Ordering::SeqCst), bulk_before);
    assert_eq!(Widget::count(&store).await.unwrap(), 0);
}

#[tokio::test]
async fn cursors_are_lazy() {
    let store = setup();
    seed(&store, &[("p1", 40)]).await;

    let cursor = Profile::find(&store, doc! { "age": 40 });
    assert_eq!(cursor.count().await.unwrap(), 1);

    // Data added after the cursor was built is visible to later executions.
    seed(&store, &[("p2", 40)]).await;
    assert_eq!(cursor.count().await.unwrap(), 2);
}

#[tokio::test]
async fn cursor_exposes_the_bound_collection() {
    let store = setup();
    seed(&store, &[("p1", 40)]).await;

    let cursor = Profile::find(&store, doc! { "age": 40 });
    let collection = cursor.collection();
    assert_eq!(collection.name(), "profile");

    let raw = collection
        .find(cursor.selector().clone(), cursor.options().clone())
        .await
        .unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].get_str("name").unwrap(), "p1");
}

#[tokio::test]
async fn operator_filters_pass_through() {
    let store = setup();
    seed(&store, &[("a", 10), ("b", 20), ("c", 30)]).await;

    assert_eq!(
        Profile::find(&store, doc! { "age": { "$gte": 20 } })
            .count()
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        Profile::find(&store, doc! { "name": { "$in": ["a", "c"] } })
            .count()
            .await
            .unwrap(),
        2
    );
}
