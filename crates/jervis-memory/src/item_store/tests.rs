use chrono::Utc;
use jervis_core::ids::ConnectionId;
use jervis_core::model::Capability;
use tokio_util::sync::CancellationToken;

use super::{ContinuousNewItems, ItemStore};
use crate::types::ItemState;

async fn store() -> ItemStore {
    ItemStore::in_memory().await.unwrap()
}

#[tokio::test]
async fn insert_new_is_idempotent_and_exists_reports_true() {
    let store = store().await;
    let conn = ConnectionId::new();

    assert!(!store.exists(conn, "p1").await.unwrap());
    store
        .insert_new(conn, "p1", Capability::Wiki, "Title", "body", &[], None, Utc::now())
        .await
        .unwrap();
    assert!(store.exists(conn, "p1").await.unwrap());

    // Second insert of the same natural key is a no-op, not an error.
    store
        .insert_new(conn, "p1", Capability::Wiki, "Title 2", "body 2", &[], None, Utc::now())
        .await
        .unwrap();
    let item = store.get(conn, "p1").await.unwrap().unwrap();
    assert_eq!(item.title, "Title");
}

#[tokio::test]
async fn mark_as_indexed_clears_payload_and_is_terminal() {
    let store = store().await;
    let conn = ConnectionId::new();
    store
        .insert_new(conn, "p1", Capability::Bugtracker, "Title", "body", &[], None, Utc::now())
        .await
        .unwrap();

    store.mark_as_indexed(conn, "p1").await.unwrap();
    let item = store.get(conn, "p1").await.unwrap().unwrap();
    assert_eq!(item.state, ItemState::Indexed);
    assert_eq!(item.title, "");
    assert_eq!(item.body, "");

    // Indexed -> anything is a no-op: mark_as_failed after Indexed shouldn't
    // clobber the shell back into Failed.
    store.mark_as_failed(conn, "p1", "late failure").await.unwrap();
    let item = store.get(conn, "p1").await.unwrap().unwrap();
    assert_eq!(item.state, ItemState::Indexed);
}

#[tokio::test]
async fn mark_as_failed_appends_reasons_with_semicolon() {
    let store = store().await;
    let conn = ConnectionId::new();
    store
        .insert_new(conn, "p1", Capability::Mail, "Title", "body", &[], None, Utc::now())
        .await
        .unwrap();

    store.mark_as_failed(conn, "p1", "timeout").await.unwrap();
    store.mark_as_failed(conn, "p1", "retry timeout").await.unwrap();

    let item = store.get(conn, "p1").await.unwrap().unwrap();
    assert_eq!(item.state, ItemState::Failed);
    assert_eq!(item.error.as_deref(), Some("timeout;retry timeout"));
}

#[tokio::test]
async fn reset_failed_to_new_clears_error_and_only_applies_to_failed_rows() {
    let store = store().await;
    let conn = ConnectionId::new();
    store
        .insert_new(conn, "p1", Capability::Repository, "Title", "body", &[], None, Utc::now())
        .await
        .unwrap();
    store.mark_as_failed(conn, "p1", "boom").await.unwrap();

    store.reset_failed_to_new(conn, "p1").await.unwrap();
    let item = store.get(conn, "p1").await.unwrap().unwrap();
    assert_eq!(item.state, ItemState::New);
    assert!(item.error.is_none());

    // Resetting a New row (not Failed) is a no-op.
    store.reset_failed_to_new(conn, "p1").await.unwrap();
    let item = store.get(conn, "p1").await.unwrap().unwrap();
    assert_eq!(item.state, ItemState::New);
}

#[tokio::test]
async fn continuous_new_items_yields_every_new_row_then_stops_on_cancel() {
    let store = store().await;
    let conn = ConnectionId::new();
    for i in 0..3 {
        store
            .insert_new(conn, &format!("p{i}"), Capability::Wiki, "t", "b", &[], None, Utc::now())
            .await
            .unwrap();
    }

    let cancel = CancellationToken::new();
    let mut seq = ContinuousNewItems::new(store.clone(), 10, cancel.clone());

    let mut seen = Vec::new();
    for _ in 0..3 {
        let item = seq.next().await.unwrap();
        store.mark_as_indexed(item.connection_id, &item.remote_id).await.unwrap();
        seen.push(item.remote_id);
    }
    assert_eq!(seen.len(), 3);

    cancel.cancel();
    assert!(seq.next().await.is_none());
}
