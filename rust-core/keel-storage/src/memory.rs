// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory storage backend for Keel.
//
// Records live in one `BTreeMap` per (database, table) pair, wrapped in a
// tokio `RwLock`. Key ordering makes prefix scans and offset/limit paging
// deterministic. Expiry is honored: expired records are invisible to reads
// and purged from a table the next time it is written.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::{BackendCapabilities, StorageBackend, StoreOptions};
use crate::error::StorageError;
use crate::options::{DeleteOptions, ReadOptions, WriteOptions};
use crate::record::{Payload, Record};

type Location = (String, String);

#[derive(Debug, Clone)]
struct StoredRecord {
    value: Vec<u8>,
    metadata: BTreeMap<String, String>,
    expires_at: Option<DateTime<Utc>>,
}

impl StoredRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    fn to_record(&self, key: &str, now: DateTime<Utc>) -> Record {
        Record {
            key: key.to_string(),
            value: self.value.clone(),
            metadata: self.metadata.clone(),
            expiry: self
                .expires_at
                .and_then(|at| (at - now).to_std().ok()),
        }
    }
}

/// An in-memory storage backend.
///
/// Stores [`Payload::Record`] values only; `update` is a full replace, the
/// same as `write`. Results decode as [`Record`]. Clones share state.
///
/// # Example
///
/// ```rust
/// use keel_storage::{InMemoryBackend, ReadOptions, Record, StorageBackend, WriteOptions};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryBackend::new();
/// store
///     .write(Record::new("hello", "world").into(), WriteOptions::new().to("app", "greetings"))
///     .await
///     .unwrap();
///
/// let mut found: Option<Record> = None;
/// store
///     .read(ReadOptions::new().from("app", "greetings").key("hello").result(&mut found))
///     .await
///     .unwrap();
/// assert_eq!(found.unwrap().value, b"world".to_vec());
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    options: StoreOptions,
    data: Arc<RwLock<HashMap<Location, BTreeMap<String, StoredRecord>>>>,
}

impl InMemoryBackend {
    /// Create a new, empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) records across all tables.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        let map = self.data.read().await;
        map.values()
            .flat_map(|table| table.values())
            .filter(|record| !record.is_expired(now))
            .count()
    }

    /// Return true if no live records are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn locate(&self, database: &str, table: &str) -> Location {
        self.options.resolve(database, table)
    }

    async fn put(&self, payload: Payload, options: WriteOptions) -> Result<(), StorageError> {
        let record = match payload {
            Payload::Record(record) => record,
            Payload::Document(_) => {
                return Err(StorageError::InvalidPayload(
                    "in-memory backend stores records, not documents".to_string(),
                ))
            }
        };

        let now = Utc::now();
        let expires_at = options.effective_expiry(now).or_else(|| {
            record
                .expiry
                .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
                .and_then(|ttl| now.checked_add_signed(ttl))
        });
        let location = self.locate(&options.database, &options.table);

        let mut map = self.data.write().await;
        let table = map.entry(location).or_default();
        table.retain(|_, stored| !stored.is_expired(now));
        table.insert(
            record.key.clone(),
            StoredRecord {
                value: record.value,
                metadata: record.metadata,
                expires_at,
            },
        );
        debug!(key = %record.key, "memory record written");
        Ok(())
    }
}

fn encode_rows(records: Vec<Record>) -> Result<Vec<Value>, StorageError> {
    records
        .into_iter()
        .map(|record| serde_json::to_value(record).map_err(StorageError::from))
        .collect()
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn init(&mut self, options: StoreOptions) -> Result<(), StorageError> {
        self.options = options;
        Ok(())
    }

    async fn list(&self, options: ReadOptions<'_>) -> Result<(), StorageError> {
        let now = Utc::now();
        let location = self.locate(&options.database, &options.table);
        let records: Vec<Record> = {
            let map = self.data.read().await;
            match map.get(&location) {
                Some(table) => table
                    .range(options.prefix.clone()..)
                    .take_while(|(key, _)| key.starts_with(&options.prefix))
                    .filter(|(key, stored)| {
                        key.ends_with(&options.suffix) && !stored.is_expired(now)
                    })
                    .skip(options.offset)
                    .take(options.effective_limit())
                    .map(|(key, stored)| stored.to_record(key, now))
                    .collect(),
                None => Vec::new(),
            }
        };
        debug!(rows = records.len(), "memory list");
        options.deliver(encode_rows(records)?)
    }

    async fn read(&self, options: ReadOptions<'_>) -> Result<(), StorageError> {
        let now = Utc::now();
        let location = self.locate(&options.database, &options.table);
        let record = {
            let map = self.data.read().await;
            map.get(&location)
                .and_then(|table| table.get(&options.key))
                .filter(|stored| !stored.is_expired(now))
                .map(|stored| stored.to_record(&options.key, now))
        };
        match record {
            Some(record) => options.deliver(encode_rows(vec![record])?),
            None => Err(StorageError::NotFound(format!(
                "{}/{}/{}",
                location.0, location.1, options.key
            ))),
        }
    }

    async fn write(&self, payload: Payload, options: WriteOptions) -> Result<(), StorageError> {
        self.put(payload, options).await
    }

    async fn update(&self, payload: Payload, options: WriteOptions) -> Result<(), StorageError> {
        self.put(payload, options).await
    }

    async fn delete(&self, options: DeleteOptions) -> Result<(), StorageError> {
        let location = self.locate(&options.database, &options.table);
        let mut map = self.data.write().await;
        if let Some(table) = map.get_mut(&location) {
            table.remove(&options.key);
        }
        Ok(())
    }

    fn options(&self) -> StoreOptions {
        self.options.clone()
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            expiry: true,
            list_filters: true,
        }
    }
}
