// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-call options for read, write and delete operations.
//
// Each option type is a plain struct with empty/zero defaults and consuming
// builder methods. Setting the same field twice keeps the last value. Nothing
// is validated here; backends reject combinations they cannot serve.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StorageError;

/// An output slot that `list` and `read` decode their results into.
///
/// Implemented for `Vec<T>` (every row, replacing previous contents) and
/// `Option<T>` (the first row, or `None`).
pub trait DecodeTarget: Send {
    /// Decode backend rows into this target.
    fn decode(&mut self, rows: Vec<Value>) -> Result<(), StorageError>;
}

impl<T: DeserializeOwned + Send> DecodeTarget for Vec<T> {
    fn decode(&mut self, rows: Vec<Value>) -> Result<(), StorageError> {
        let decoded = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        *self = decoded;
        Ok(())
    }
}

impl<T: DeserializeOwned + Send> DecodeTarget for Option<T> {
    fn decode(&mut self, rows: Vec<Value>) -> Result<(), StorageError> {
        *self = match rows.into_iter().next() {
            Some(row) => Some(serde_json::from_value(row)?),
            None => None,
        };
        Ok(())
    }
}

/// Options for `list` and `read`.
#[derive(Default)]
pub struct ReadOptions<'a> {
    /// Database to read from. Empty falls back to the backend's init options.
    pub database: String,
    /// Table to read from. Empty falls back to the backend's init options.
    pub table: String,
    /// Record key, or the filter field name for document backends.
    pub key: String,
    /// Filter field value for document backends.
    pub value: String,
    /// Only keys starting with this.
    pub prefix: String,
    /// Only keys ending with this.
    pub suffix: String,
    /// Maximum rows returned. Zero means unlimited.
    pub limit: usize,
    /// Rows skipped before the first returned one.
    pub offset: usize,
    result: Option<&'a mut dyn DecodeTarget>,
}

impl<'a> ReadOptions<'a> {
    /// Empty options: no filters, no pagination, no result target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set database and table.
    pub fn from(mut self, database: impl Into<String>, table: impl Into<String>) -> Self {
        self.database = database.into();
        self.table = table.into();
        self
    }

    /// Set the key (or filter field name).
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Set the filter field value.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the key prefix filter.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the key suffix filter.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Set the row limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the row offset.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Set the target results are decoded into.
    pub fn result<T: DecodeTarget>(mut self, target: &'a mut T) -> Self {
        self.result = Some(target);
        self
    }

    /// Whether a result target has been set.
    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    /// `limit` as an iterator bound.
    pub fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            usize::MAX
        } else {
            self.limit
        }
    }

    /// Decode `rows` into the result target, consuming the options.
    pub fn deliver(self, rows: Vec<Value>) -> Result<(), StorageError> {
        match self.result {
            Some(target) => target.decode(rows),
            None => Err(StorageError::DecodeTargetMissing),
        }
    }
}

impl fmt::Debug for ReadOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("database", &self.database)
            .field("table", &self.table)
            .field("key", &self.key)
            .field("value", &self.value)
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("has_result", &self.has_result())
            .finish()
    }
}

/// Options for `write` and `update`.
///
/// If both `expiry` and `ttl` are set, `ttl` takes precedence. Only backends
/// reporting `BackendCapabilities::expiry` act on either.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Target database.
    pub database: String,
    /// Target table.
    pub table: String,
    /// Filter field name used by `update` to find the document.
    pub key: String,
    /// Filter field value used by `update` to find the document.
    pub value: String,
    /// Absolute expiry time.
    pub expiry: Option<DateTime<Utc>>,
    /// Time to live from the moment of writing.
    pub ttl: Option<Duration>,
}

impl WriteOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set database and table.
    pub fn to(mut self, database: impl Into<String>, table: impl Into<String>) -> Self {
        self.database = database.into();
        self.table = table.into();
        self
    }

    /// Set the filter field name.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Set the filter field value.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set an absolute expiry.
    pub fn expiry(mut self, at: DateTime<Utc>) -> Self {
        self.expiry = Some(at);
        self
    }

    /// Set a time to live.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Resolve when a record written at `now` expires. A zero ttl counts as unset.
    pub fn effective_expiry(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.ttl.filter(|ttl| !ttl.is_zero()) {
            Some(ttl) => chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| now.checked_add_signed(ttl)),
            None => self.expiry,
        }
    }
}

/// Options for `delete`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Target database.
    pub database: String,
    /// Target table.
    pub table: String,
    /// Record key, or the filter field name for document backends.
    pub key: String,
    /// Filter field value for document backends.
    pub value: String,
}

impl DeleteOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set database and table.
    pub fn from(mut self, database: impl Into<String>, table: impl Into<String>) -> Self {
        self.database = database.into();
        self.table = table.into();
        self
    }

    /// Set the key (or filter field name).
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Set the filter field value.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}
