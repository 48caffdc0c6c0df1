// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core storage backend trait for Keel.
//
// Defines the `StorageBackend` trait that every storage implementation must
// satisfy: one-time initialization, list/read into a caller-supplied result
// target, write/update of a payload, delete, and introspection. Backends are
// expected to be thread-safe (`Send + Sync`) and fully asynchronous.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::options::{DeleteOptions, ReadOptions, WriteOptions};
use crate::record::Payload;

/// Database and table used when neither the call nor `init` names one.
pub const DEFAULT_NAMESPACE: &str = "keel";

/// Backend-wide options supplied to [`StorageBackend::init`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Connection endpoints. The document backend uses the first one.
    pub nodes: Vec<String>,
    /// Default database for calls that leave it empty.
    pub database: String,
    /// Default table for calls that leave it empty.
    pub table: String,
}

impl StoreOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection endpoint. Blank endpoints are skipped.
    pub fn node(mut self, node: impl Into<String>) -> Self {
        let node = node.into();
        if !node.trim().is_empty() {
            self.nodes.push(node);
        }
        self
    }

    /// Set the default database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the default table.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Resolve the (database, table) pair a call addresses.
    ///
    /// Call values win, then init values, then [`DEFAULT_NAMESPACE`].
    pub fn resolve(&self, database: &str, table: &str) -> (String, String) {
        let pick = |call: &str, init: &str| {
            if !call.is_empty() {
                call.to_string()
            } else if !init.is_empty() {
                init.to_string()
            } else {
                DEFAULT_NAMESPACE.to_string()
            }
        };
        (pick(database, &self.database), pick(table, &self.table))
    }
}

/// Which parts of the shared option model a backend acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendCapabilities {
    /// `WriteOptions::expiry` and `WriteOptions::ttl` are enforced.
    pub expiry: bool,
    /// `list` applies `prefix`/`suffix` filters.
    pub list_filters: bool,
}

/// A pluggable storage backend.
///
/// `init` is called once, at startup, before any data operation; calling it
/// again with the same options is harmless. `list` and `read` decode their
/// results into the target set with [`ReadOptions::result`] and fail with
/// [`StorageError::DecodeTargetMissing`] when there is none.
///
/// Implementations must be safe to share across threads and tokio tasks.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Prepare the backend (open files, connect) using `options`.
    async fn init(&mut self, options: StoreOptions) -> Result<(), StorageError>;

    /// List records of a table, honoring pagination.
    async fn list(&self, options: ReadOptions<'_>) -> Result<(), StorageError>;

    /// Read a single record.
    ///
    /// Returns [`StorageError::NotFound`] when nothing matches.
    async fn read(&self, options: ReadOptions<'_>) -> Result<(), StorageError>;

    /// Store a new payload.
    async fn write(&self, payload: Payload, options: WriteOptions) -> Result<(), StorageError>;

    /// Replace or patch an existing payload.
    async fn update(&self, payload: Payload, options: WriteOptions) -> Result<(), StorageError>;

    /// Remove a record.
    async fn delete(&self, options: DeleteOptions) -> Result<(), StorageError>;

    /// The options passed to `init`.
    fn options(&self) -> StoreOptions;

    /// A human-readable name for this backend, used in logging.
    fn name(&self) -> &str;

    /// Which option fields this backend honors.
    fn capabilities(&self) -> BackendCapabilities;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_skips_blank() {
        let opts = StoreOptions::new().node("").node("  ").node("/tmp/db.redb");
        assert_eq!(opts.nodes, vec!["/tmp/db.redb".to_string()]);
    }

    #[test]
    fn test_resolve_precedence() {
        let opts = StoreOptions::new().database("app");
        assert_eq!(
            opts.resolve("", ""),
            ("app".to_string(), DEFAULT_NAMESPACE.to_string())
        );
        assert_eq!(
            opts.resolve("other", "users"),
            ("other".to_string(), "users".to_string())
        );
        assert_eq!(
            StoreOptions::new().resolve("", ""),
            (DEFAULT_NAMESPACE.to_string(), DEFAULT_NAMESPACE.to_string())
        );
    }
}
