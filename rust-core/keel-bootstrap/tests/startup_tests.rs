// SPDX-License-Identifier: PMPL-1.0-or-later
//! End-to-end startup: YAML file plus environment overrides through to
//! working storage and cache handles.

use std::io::Write;
use std::time::Duration;

use keel_bootstrap::{Adapters, BootstrapError};
use keel_storage::{ReadOptions, Record, Storage, StorageBackend, WriteOptions};
use tempfile::NamedTempFile;

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[tokio::test]
async fn test_memory_storage_and_local_cache_from_yaml() {
    let file = yaml_file("storage:\n  type: 2\n  db: orders\ncache:\n  type: 1\n  size: 2\n");
    let adapters = Adapters::load_with(Some(file.path()), no_env).await.unwrap();
    assert!(matches!(adapters.storage, Storage::Memory(_)));

    adapters
        .storage
        .write(
            Record::json("o1", &serde_json::json!({"total": 12})).unwrap().into(),
            WriteOptions::new(),
        )
        .await
        .unwrap();
    let mut found: Option<Record> = None;
    adapters
        .storage
        .read(ReadOptions::new().key("o1").result(&mut found))
        .await
        .unwrap();
    let order: serde_json::Value = found.unwrap().decode_value().unwrap();
    assert_eq!(order["total"], 12);

    adapters
        .cache
        .put("o1", &order, Duration::from_secs(5))
        .await
        .unwrap();
    let (cached, _): (serde_json::Value, _) = adapters.cache.get("o1").await.unwrap();
    assert_eq!(cached, order);
}

#[tokio::test]
async fn test_env_selects_document_storage() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("redb://{}", dir.path().join("keel.redb").display());
    let file = yaml_file("storage:\n  type: 0\n");

    let adapters = Adapters::load_with(Some(file.path()), |name| match name {
        "STORAGE_TYPE" => Some("1".to_string()),
        "STORAGE_URL" => Some(url.clone()),
        "STORAGE_DB" => Some("app".to_string()),
        _ => None,
    })
    .await
    .unwrap();
    assert_eq!(adapters.storage.name(), "document");
    assert_eq!(adapters.storage.options().database, "app");
}

#[tokio::test]
async fn test_missing_document_url_is_fatal() {
    let file = yaml_file("storage:\n  type: 1\n  url: \"\"\n");
    let err = Adapters::load_with(Some(file.path()), no_env).await.unwrap_err();
    assert!(matches!(err, BootstrapError::Config(_)));
}

#[tokio::test]
async fn test_missing_redis_address_is_fatal() {
    let file = yaml_file("cache:\n  type: 2\n");
    let err = Adapters::load_with(Some(file.path()), no_env).await.unwrap_err();
    match err {
        BootstrapError::Config(cfg) => assert_eq!(cfg.parameter(), Some("Address")),
        other => panic!("expected Config, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreadable_file_is_fatal() {
    let err = Adapters::load_with(
        Some(std::path::Path::new("/definitely/not/here/keel.yaml")),
        no_env,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BootstrapError::Config(_)));
}

fn bootstrap(config: &std::path::Path) -> std::process::ExitStatus {
    let mut command = std::process::Command::new(env!("CARGO_BIN_EXE_keel-bootstrap"));
    command.arg(config).env_remove("KEEL_CONFIG").env("RUST_LOG", "off");
    for name in [
        "STORAGE_TYPE",
        "STORAGE_URL",
        "STORAGE_DB",
        "CACHE_TYPE",
        "CACHE_SIZE",
        "CACHE_ADDRESS",
        "CACHE_USERNAME",
        "CACHE_PASSWORD",
        "CACHE_DATABASE",
    ] {
        command.env_remove(name);
    }
    command.status().unwrap()
}

#[test]
fn test_binary_exit_status() {
    let good = yaml_file("storage:\n  type: 2\ncache:\n  type: 1\n");
    assert!(bootstrap(good.path()).success());

    let bad = yaml_file("storage:\n  type: 1\n  url: \"\"\n");
    let status = bootstrap(bad.path());
    assert!(!status.success());
    assert_eq!(status.code(), Some(1));
}
