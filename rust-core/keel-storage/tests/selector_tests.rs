// SPDX-License-Identifier: PMPL-1.0-or-later
//! Storage selection from configuration.
//!
//! Exercises `Storage::from_config` end to end: discriminant decoding,
//! startup validation, and that each selected variant behaves like the
//! backend it wraps.

use keel_config::{ConfigError, StorageConfig};
use keel_storage::{
    DeleteOptions, Payload, ReadOptions, Record, Storage, StorageBackend, StorageError,
    WriteOptions,
};
use serde_json::{json, Value};
use tempfile::tempdir;

fn config(kind: i64, url: &str, db: &str) -> StorageConfig {
    StorageConfig {
        kind,
        url: url.to_string(),
        db: db.to_string(),
    }
}

#[tokio::test]
async fn test_default_config_selects_noop() {
    let storage = Storage::from_config(&StorageConfig::default()).await.unwrap();
    assert!(matches!(storage, Storage::Noop(_)));
    assert_eq!(storage.name(), "empty");
}

#[tokio::test]
async fn test_unknown_discriminant_selects_noop() {
    let storage = Storage::from_config(&config(42, "", "")).await.unwrap();
    assert!(matches!(storage, Storage::Noop(_)));
}

#[tokio::test]
async fn test_document_without_url_is_a_configuration_error() {
    for url in ["", "   "] {
        let err = Storage::from_config(&config(1, url, "app")).await.unwrap_err();
        match err {
            StorageError::Configuration(ConfigError::InvalidParameter { parameter, .. }) => {
                assert_eq!(parameter, "URL")
            }
            other => panic!("expected Configuration, got: {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_memory_storage_applies_database() {
    let storage = Storage::from_config(&config(2, "", " app ")).await.unwrap();
    assert_eq!(storage.name(), "memory");
    assert_eq!(storage.options().database, "app");
    assert!(storage.capabilities().expiry);

    storage
        .write(Record::new("k", "v").into(), WriteOptions::new())
        .await
        .unwrap();

    let mut found: Option<Record> = None;
    storage
        .read(ReadOptions::new().from("app", "").key("k").result(&mut found))
        .await
        .unwrap();
    assert_eq!(found.unwrap().value, b"v".to_vec());
}

#[tokio::test]
async fn test_document_storage_crud() {
    let dir = tempdir().unwrap();
    let url = format!("file://{}", dir.path().join("store.redb").display());
    let storage = Storage::from_config(&config(1, &url, "app")).await.unwrap();
    assert_eq!(storage.name(), "document");

    storage
        .write(
            Payload::document(&json!({"_id": "o1", "status": "open"})).unwrap(),
            WriteOptions::new().to("app", "orders"),
        )
        .await
        .unwrap();
    storage
        .update(
            json!({"status": "shipped"}).into(),
            WriteOptions::new().to("app", "orders").key("_id").value("o1"),
        )
        .await
        .unwrap();

    let mut order: Option<Value> = None;
    storage
        .read(
            ReadOptions::new()
                .from("app", "orders")
                .key("status")
                .value("shipped")
                .result(&mut order),
        )
        .await
        .unwrap();
    assert_eq!(order.unwrap()["_id"], "o1");

    storage
        .delete(DeleteOptions::new().from("app", "orders").key("_id").value("o1"))
        .await
        .unwrap();

    let mut all: Vec<Value> = Vec::new();
    storage
        .list(ReadOptions::new().from("app", "orders").result(&mut all))
        .await
        .unwrap();
    assert!(all.is_empty());
}
