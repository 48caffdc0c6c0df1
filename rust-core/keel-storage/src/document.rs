// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// redb-backed transactional document backend for Keel.
//
// Uses redb (pure Rust, B-tree, ACID, single-file database) as a document
// store. No C/C++ dependencies.
//
// # Design
//
// - The connection URL names the database file: `redb://<path>`,
//   `file://<path>` or a bare path.
// - Each (database, table) pair is one redb table named `database.table`,
//   mapping a document `_id` to its JSON encoding.
// - `write`, `update` and `delete` each run exactly one document operation
//   inside one write transaction. The transaction commits only when the
//   operation succeeded; otherwise it is aborted and nothing is visible.
// - `read` and `list` run on read snapshots, outside any write transaction.
// - `list` pages by `offset`/`limit` in `_id` order and ignores prefix,
//   suffix and field filters (`BackendCapabilities::list_filters` is false).
// - `delete` runs under a fixed deadline regardless of the caller's.
// - All redb work runs on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keel_config::ConfigError;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition, TableError,
    WriteTransaction,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::backend::{BackendCapabilities, StorageBackend, StoreOptions};
use crate::error::StorageError;
use crate::options::{DeleteOptions, ReadOptions, WriteOptions};
use crate::record::Payload;

/// Deadline applied to every `delete`, independent of the caller.
#[cfg(not(test))]
pub const DELETE_TIMEOUT: Duration = Duration::from_secs(3);
#[cfg(test)]
pub const DELETE_TIMEOUT: Duration = Duration::from_millis(300);

/// Document field holding the document key.
pub const ID_FIELD: &str = "_id";

type DocumentTable<'a> = TableDefinition<'a, &'static str, &'static [u8]>;

/// A transactional document backend powered by redb.
///
/// Must be initialized with a connection URL before use; data operations
/// issued earlier fail with [`StorageError::NotInitialized`].
///
/// # Example
///
/// ```rust,no_run
/// use keel_storage::{DocumentBackend, ReadOptions, StorageBackend, StoreOptions, WriteOptions};
/// use serde_json::{json, Value};
///
/// # tokio_test::block_on(async {
/// let mut store = DocumentBackend::new();
/// store
///     .init(StoreOptions::new().node("redb:///tmp/keel-docs.redb").database("app"))
///     .await
///     .unwrap();
///
/// store
///     .write(json!({"_id": "u1", "email": "a@example.com"}).into(), WriteOptions::new().to("app", "users"))
///     .await
///     .unwrap();
///
/// let mut user: Option<Value> = None;
/// store
///     .read(ReadOptions::new().from("app", "users").key("email").value("a@example.com").result(&mut user))
///     .await
///     .unwrap();
/// assert_eq!(user.unwrap()["_id"], "u1");
/// # });
/// ```
#[derive(Default)]
pub struct DocumentBackend {
    options: StoreOptions,
    db: Option<Arc<Database>>,
    path: Option<PathBuf>,
}

impl DocumentBackend {
    /// Create an uninitialized backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the open database file, once initialized.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of documents visible in a table.
    pub async fn count(&self, database: &str, table: &str) -> Result<u64, StorageError> {
        let db = self.database()?;
        let name = self.table_name(database, table);
        blocking(move || {
            let txn = db
                .begin_read()
                .map_err(|e| StorageError::BackendUnavailable(format!("read txn: {e}")))?;
            let table = match txn.open_table(definition(&name)) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(0),
                Err(e) => return Err(StorageError::Backend(format!("open table: {e}"))),
            };
            table
                .len()
                .map_err(|e| StorageError::Backend(format!("count: {e}")))
        })
        .await
    }

    fn database(&self) -> Result<Arc<Database>, StorageError> {
        self.db
            .clone()
            .ok_or_else(|| StorageError::NotInitialized(self.name().to_string()))
    }

    fn table_name(&self, database: &str, table: &str) -> String {
        let (database, table) = self.options.resolve(database, table);
        format!("{database}.{table}")
    }
}

impl std::fmt::Debug for DocumentBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBackend")
            .field("path", &self.path)
            .field("database", &self.options.database)
            .finish()
    }
}

/// Turn a connection URL into a database file path.
pub fn database_path(url: &str) -> PathBuf {
    let url = url.trim();
    let path = url
        .strip_prefix("redb://")
        .or_else(|| url.strip_prefix("file://"))
        .unwrap_or(url);
    PathBuf::from(path)
}

fn definition(name: &str) -> DocumentTable<'_> {
    TableDefinition::new(name)
}

fn join_error(e: tokio::task::JoinError) -> StorageError {
    StorageError::BackendUnavailable(format!("task join: {e}"))
}

async fn blocking<T, F>(work: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(join_error)?
}

const PENDING: u8 = 0;
const COMMITTING: u8 = 1;
const EXPIRED: u8 = 2;

/// Decides, exactly once, whether a deadline-bound transaction commits or
/// the waiting caller reports a timeout. Whichever side claims it first wins.
#[derive(Debug)]
struct Deadline {
    limit: Duration,
    state: AtomicU8,
}

impl Deadline {
    fn new(limit: Duration) -> Self {
        Self {
            limit,
            state: AtomicU8::new(PENDING),
        }
    }

    /// Called by the transaction right before commit.
    fn claim_commit(&self) -> bool {
        self.state
            .compare_exchange(PENDING, COMMITTING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Called by the caller when its timer fires.
    fn expire(&self) -> bool {
        self.state
            .compare_exchange(PENDING, EXPIRED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is_expired(&self) -> bool {
        self.state.load(Ordering::Acquire) == EXPIRED
    }
}

fn abort(txn: WriteTransaction) {
    if let Err(abort) = txn.abort() {
        warn!(error = %abort, "failed to abort document transaction");
    }
}

/// Run one operation in a write transaction; commit on success, abort otherwise.
///
/// With a `deadline`, the transaction also aborts if the caller gave up
/// before the commit was claimed.
fn in_transaction<T, F>(db: &Database, deadline: Option<&Deadline>, op: F) -> Result<T, StorageError>
where
    F: FnOnce(&WriteTransaction) -> Result<T, StorageError>,
{
    let txn = db
        .begin_write()
        .map_err(|e| StorageError::BackendUnavailable(format!("write txn: {e}")))?;
    if let Some(deadline) = deadline.filter(|d| d.is_expired()) {
        abort(txn);
        return Err(StorageError::Timeout(deadline.limit));
    }
    match op(&txn) {
        Ok(out) => {
            if let Some(deadline) = deadline.filter(|d| !d.claim_commit()) {
                abort(txn);
                return Err(StorageError::Timeout(deadline.limit));
            }
            txn.commit().map_err(|e| {
                StorageError::TransactionAborted(Box::new(StorageError::Backend(format!(
                    "commit: {e}"
                ))))
            })?;
            Ok(out)
        }
        Err(err) => {
            abort(txn);
            Err(StorageError::TransactionAborted(Box::new(err)))
        }
    }
}

/// Convert a payload into a JSON object document.
fn into_document(payload: Payload) -> Result<Map<String, Value>, StorageError> {
    match payload {
        Payload::Document(Value::Object(doc)) => Ok(doc),
        Payload::Document(other) => Err(StorageError::InvalidPayload(format!(
            "documents must be JSON objects, got {}",
            json_kind(&other)
        ))),
        Payload::Record(record) => match serde_json::from_slice::<Value>(&record.value) {
            Ok(Value::Object(mut doc)) => {
                if !record.key.is_empty() {
                    doc.insert(ID_FIELD.to_string(), Value::String(record.key));
                }
                Ok(doc)
            }
            _ => Err(StorageError::InvalidPayload(format!(
                "record '{}' does not hold a JSON object",
                record.key
            ))),
        },
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Render a field value the way filters compare it.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn document_id(doc: &mut Map<String, Value>) -> String {
    match doc.get(ID_FIELD) {
        Some(Value::Null) | None => {
            let id = uuid::Uuid::new_v4().to_string();
            doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            id
        }
        Some(id) => field_text(id),
    }
}

/// A single field/value filter. An empty field matches nothing.
fn matches(doc: &Value, field: &str, value: &str) -> bool {
    if field.is_empty() {
        return false;
    }
    doc.get(field).is_some_and(|found| field_text(found) == value)
}

fn decode(bytes: &[u8]) -> Result<Value, StorageError> {
    serde_json::from_slice(bytes)
        .map_err(|e| StorageError::SerializationError(format!("stored document: {e}")))
}

/// Find the first document matching `field == value` in a readable table.
fn find_first<T>(table: &T, field: &str, value: &str) -> Result<Option<(String, Value)>, StorageError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    if field.is_empty() {
        return Ok(None);
    }
    let iter = table
        .iter()
        .map_err(|e| StorageError::Backend(format!("scan: {e}")))?;
    for entry in iter {
        let (key, raw) = entry.map_err(|e| StorageError::Backend(format!("scan entry: {e}")))?;
        let doc = decode(raw.value())?;
        if matches(&doc, field, value) {
            return Ok(Some((key.value().to_string(), doc)));
        }
    }
    Ok(None)
}

#[async_trait]
impl StorageBackend for DocumentBackend {
    async fn init(&mut self, options: StoreOptions) -> Result<(), StorageError> {
        let url = options
            .nodes
            .first()
            .map(|node| node.trim().to_string())
            .filter(|node| !node.is_empty())
            .ok_or_else(|| ConfigError::invalid("URL", "document store expects a valid url"))?;
        let path = database_path(&url);

        if self.db.is_some() && self.path.as_deref() == Some(path.as_path()) {
            self.options = options;
            return Ok(());
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(&path).map_err(|e| {
            StorageError::BackendUnavailable(format!(
                "failed to open document store at {}: {}",
                path.display(),
                e
            ))
        })?;

        info!(path = %path.display(), database = %options.database, "opened document store");
        self.db = Some(Arc::new(db));
        self.path = Some(path);
        self.options = options;
        Ok(())
    }

    async fn list(&self, options: ReadOptions<'_>) -> Result<(), StorageError> {
        let db = self.database()?;
        let name = self.table_name(&options.database, &options.table);
        if !options.prefix.is_empty() || !options.suffix.is_empty() || !options.key.is_empty() {
            debug!(table = %name, "document list ignores prefix, suffix and field filters");
        }
        let (offset, limit) = (options.offset, options.effective_limit());

        let rows = blocking(move || {
            let txn = db
                .begin_read()
                .map_err(|e| StorageError::BackendUnavailable(format!("read txn: {e}")))?;
            let table = match txn.open_table(definition(&name)) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
                Err(e) => return Err(StorageError::Backend(format!("open table: {e}"))),
            };
            let iter = table
                .iter()
                .map_err(|e| StorageError::Backend(format!("scan: {e}")))?;
            let mut rows = Vec::new();
            for entry in iter.skip(offset).take(limit) {
                let (_, raw) =
                    entry.map_err(|e| StorageError::Backend(format!("scan entry: {e}")))?;
                rows.push(decode(raw.value())?);
            }
            Ok(rows)
        })
        .await?;

        debug!(rows = rows.len(), "document list");
        options.deliver(rows)
    }

    async fn read(&self, options: ReadOptions<'_>) -> Result<(), StorageError> {
        let db = self.database()?;
        let name = self.table_name(&options.database, &options.table);
        let (field, value) = (options.key.clone(), options.value.clone());

        let lookup_name = name.clone();
        let found = blocking(move || {
            let txn = db
                .begin_read()
                .map_err(|e| StorageError::BackendUnavailable(format!("read txn: {e}")))?;
            let table = match txn.open_table(definition(&lookup_name)) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                Err(e) => return Err(StorageError::Backend(format!("open table: {e}"))),
            };
            find_first(&table, &field, &value)
        })
        .await?;

        match found {
            Some((_, doc)) => options.deliver(vec![doc]),
            None => Err(StorageError::NotFound(format!(
                "{} where {} = {:?}",
                name, options.key, options.value
            ))),
        }
    }

    async fn write(&self, payload: Payload, options: WriteOptions) -> Result<(), StorageError> {
        let db = self.database()?;
        let name = self.table_name(&options.database, &options.table);
        let mut doc = into_document(payload)?;
        let id = document_id(&mut doc);
        let bytes = serde_json::to_vec(&Value::Object(doc))?;

        blocking(move || {
            in_transaction(&db, None, |txn| {
                let mut table = txn
                    .open_table(definition(&name))
                    .map_err(|e| StorageError::Backend(format!("open table: {e}")))?;
                let exists = table
                    .get(id.as_str())
                    .map_err(|e| StorageError::Backend(format!("get: {e}")))?
                    .is_some();
                if exists {
                    return Err(StorageError::DuplicateKey(id.clone()));
                }
                table
                    .insert(id.as_str(), bytes.as_slice())
                    .map_err(|e| StorageError::Backend(format!("insert: {e}")))?;
                debug!(table = %name, id = %id, "document inserted");
                Ok(())
            })
        })
        .await
    }

    async fn update(&self, payload: Payload, options: WriteOptions) -> Result<(), StorageError> {
        let db = self.database()?;
        let name = self.table_name(&options.database, &options.table);
        let patch = into_document(payload)?;
        let (field, value) = (options.key, options.value);

        blocking(move || {
            in_transaction(&db, None, |txn| {
                let mut table = txn
                    .open_table(definition(&name))
                    .map_err(|e| StorageError::Backend(format!("open table: {e}")))?;
                let Some((id, mut doc)) = find_first(&table, &field, &value)? else {
                    debug!(table = %name, "update matched no document");
                    return Ok(());
                };
                if let Value::Object(fields) = &mut doc {
                    for (k, v) in patch {
                        if k != ID_FIELD {
                            fields.insert(k, v);
                        }
                    }
                }
                let bytes = serde_json::to_vec(&doc)?;
                table
                    .insert(id.as_str(), bytes.as_slice())
                    .map_err(|e| StorageError::Backend(format!("update: {e}")))?;
                debug!(table = %name, id = %id, "document updated");
                Ok(())
            })
        })
        .await
    }

    async fn delete(&self, options: DeleteOptions) -> Result<(), StorageError> {
        let db = self.database()?;
        let name = self.table_name(&options.database, &options.table);
        let (field, value) = (options.key, options.value);

        let deadline = Arc::new(Deadline::new(DELETE_TIMEOUT));
        let guard = Arc::clone(&deadline);
        let mut work = tokio::task::spawn_blocking(move || {
            in_transaction(&db, Some(guard.as_ref()), |txn| {
                let mut table = txn
                    .open_table(definition(&name))
                    .map_err(|e| StorageError::Backend(format!("open table: {e}")))?;
                if let Some((id, _)) = find_first(&table, &field, &value)? {
                    table
                        .remove(id.as_str())
                        .map_err(|e| StorageError::Backend(format!("remove: {e}")))?;
                    debug!(table = %name, id = %id, "document deleted");
                }
                Ok(())
            })
        });

        match tokio::time::timeout(DELETE_TIMEOUT, &mut work).await {
            Ok(joined) => joined.map_err(join_error)?,
            Err(_) if deadline.expire() => {
                warn!(limit = ?DELETE_TIMEOUT, "document delete timed out");
                Err(StorageError::Timeout(DELETE_TIMEOUT))
            }
            // The commit was claimed before the timer fired; report its outcome.
            Err(_) => work.await.map_err(join_error)?,
        }
    }

    fn options(&self) -> StoreOptions {
        self.options.clone()
    }

    fn name(&self) -> &str {
        "document"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            expiry: false,
            list_filters: false,
        }
    }
}
