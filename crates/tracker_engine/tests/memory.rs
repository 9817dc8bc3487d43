use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracker_core::{RecordFields, RecordId, RecordPatch, Status, UserId};
use tracker_engine::{ChangeFeed, FailureKind, MemoryStore, RecordStore, Subscription};

fn counter() -> (Arc<AtomicUsize>, tracker_engine::ChangeCallback) {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = hits.clone();
    (
        hits,
        Arc::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

#[tokio::test]
async fn create_assigns_id_and_lists_newest_first() {
    let store = MemoryStore::new();
    let user = UserId::new("u1");

    let first = store
        .create_record(&user, &RecordFields::new("Backend Engineer", "Acme", Status::Saved))
        .await
        .expect("create");
    let second = store
        .create_record(&user, &RecordFields::new("SRE", "Globex", Status::Applied))
        .await
        .expect("create");
    assert_ne!(first, second);

    let records = store.list_records(&user).await.expect("list");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, second);
    assert_eq!(records[1].id, first);
    assert!(records[0].created_at > records[1].created_at);
    assert_eq!(records[1].title, "Backend Engineer");
    assert_eq!(records[1].company, "Acme");
    assert_eq!(records[1].status, Status::Saved);
}

#[tokio::test]
async fn records_are_scoped_to_their_owner() {
    let store = MemoryStore::new();
    store.insert(&UserId::new("alice"), RecordFields::new("A", "Acme", Status::Saved));
    store.insert(&UserId::new("bob"), RecordFields::new("B", "Acme", Status::Saved));

    let alice = store.list_records(&UserId::new("alice")).await.unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].title, "A");
}

#[tokio::test]
async fn update_and_delete_notify_owner_only() {
    let store = MemoryStore::new();
    let alice = UserId::new("alice");
    let record = store.insert(&alice, RecordFields::new("A", "Acme", Status::Saved));

    let (alice_hits, alice_cb) = counter();
    let (bob_hits, bob_cb) = counter();
    let _alice_sub = store.subscribe(&alice, alice_cb).unwrap();
    let _bob_sub = store.subscribe(&UserId::new("bob"), bob_cb).unwrap();

    store
        .update_record(&record.id, &RecordPatch::status(Status::Offer))
        .await
        .unwrap();
    assert_eq!(store.snapshot(&alice)[0].status, Status::Offer);

    store.delete_record(&record.id).await.unwrap();
    assert!(store.snapshot(&alice).is_empty());

    assert_eq!(alice_hits.load(Ordering::SeqCst), 2);
    assert_eq!(bob_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unsubscribe_removes_listener() {
    let store = MemoryStore::new();
    let user = UserId::new("u");
    let (hits, callback) = counter();
    let subscription = store.subscribe(&user, callback).unwrap();
    assert_eq!(store.listener_count(), 1);

    subscription.unsubscribe();
    assert_eq!(store.listener_count(), 0);
    store.insert(&user, RecordFields::new("A", "Acme", Status::Saved));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_record_is_not_found() {
    let store = MemoryStore::new();
    let err = store.delete_record(&RecordId::new("nope")).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::NotFound);
}

#[tokio::test]
async fn injected_failure_leaves_data_untouched() {
    let store = MemoryStore::new();
    let user = UserId::new("u");
    let record = store.insert(&user, RecordFields::new("A", "Acme", Status::Saved));

    store.set_failure(Some(FailureKind::Network));
    let err = store.delete_record(&record.id).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
    assert!(store.list_records(&user).await.is_err());

    store.set_failure(None);
    assert_eq!(store.list_records(&user).await.unwrap().len(), 1);
}
