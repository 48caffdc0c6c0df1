// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Write payloads: raw keyed records and structured documents.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// A keyed, opaque value.
///
/// Records are what the in-memory backend stores and returns. The document
/// backend accepts them too, provided `value` holds a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record key, unique within a (database, table) pair.
    pub key: String,
    /// Raw value bytes.
    pub value: Vec<u8>,
    /// Free-form string metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Time left before the record expires. `None` never expires.
    #[serde(default)]
    pub expiry: Option<Duration>,
}

impl Record {
    /// Create a record from a key and raw bytes.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Create a record whose value is the JSON encoding of `value`.
    pub fn json<T: Serialize>(key: impl Into<String>, value: &T) -> Result<Self, StorageError> {
        Ok(Self::new(key, serde_json::to_vec(value)?))
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(name.into(), value.into());
        self
    }

    /// Expire the record `ttl` after it is written, unless the write options say otherwise.
    pub fn with_expiry(mut self, ttl: Duration) -> Self {
        self.expiry = Some(ttl);
        self
    }

    /// Decode the value bytes as JSON.
    pub fn decode_value<T: DeserializeOwned>(&self) -> Result<T, StorageError> {
        serde_json::from_slice(&self.value).map_err(|err| {
            StorageError::SerializationError(format!(
                "failed to decode value for key '{}': {}",
                self.key, err
            ))
        })
    }
}

/// What a `write` or `update` call stores.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A keyed record of raw bytes.
    Record(Record),
    /// A structured document; backends that accept it expect a JSON object.
    Document(serde_json::Value),
}

impl Payload {
    /// Serialize any value into a document payload.
    pub fn document<T: Serialize>(value: &T) -> Result<Self, StorageError> {
        Ok(Payload::Document(serde_json::to_value(value)?))
    }
}

impl From<Record> for Payload {
    fn from(record: Record) -> Self {
        Payload::Record(record)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Document(value)
    }
}
