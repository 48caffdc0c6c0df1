// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Keel Storage Backend Abstraction
//
// This crate provides a pluggable persistence interface for Keel services.
// The `StorageBackend` trait defines the contract every backend implements,
// so a service can swap storage by configuration without changing its code.
//
// # Modules
//
// - [`backend`] -- The `StorageBackend` trait and backend-wide `StoreOptions`.
// - [`options`] -- Per-call `ReadOptions`, `WriteOptions` and `DeleteOptions`.
// - [`record`] -- Write payloads: keyed `Record`s and JSON documents.
// - [`error`] -- The `StorageError` enum covering all backend failure modes.
// - [`memory`] -- An in-memory backend for tests and ephemeral workloads.
// - [`document`] -- A transactional document backend on redb.
// - [`noop`] -- A backend that accepts everything and keeps nothing.
// - [`storage`] -- The `Storage` enum selected from configuration.
//
// # Example
//
// ```rust
// use keel_storage::{InMemoryBackend, ReadOptions, Record, StorageBackend, WriteOptions};
//
// # tokio_test::block_on(async {
// let store = InMemoryBackend::new();
// store
//     .write(Record::new("greeting", "hello").into(), WriteOptions::new().to("app", "kv"))
//     .await
//     .unwrap();
//
// let mut found: Option<Record> = None;
// store
//     .read(ReadOptions::new().from("app", "kv").key("greeting").result(&mut found))
//     .await
//     .unwrap();
// assert_eq!(found.unwrap().value, b"hello");
// # });
// ```

pub mod backend;
pub mod document;
pub mod error;
pub mod memory;
pub mod noop;
pub mod options;
pub mod record;
pub mod storage;

// Re-export the most commonly used types at the crate root for convenience.
pub use backend::{BackendCapabilities, StorageBackend, StoreOptions, DEFAULT_NAMESPACE};
pub use document::DocumentBackend;
pub use error::StorageError;
pub use memory::InMemoryBackend;
pub use noop::NoopBackend;
pub use options::{DecodeTarget, DeleteOptions, ReadOptions, WriteOptions};
pub use record::{Payload, Record};
pub use storage::Storage;
