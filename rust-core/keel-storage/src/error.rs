// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Storage error types for the Keel backend abstraction.
//
// Covers every failure a storage backend may surface: configuration problems
// caught at startup, a read issued without an output target, driver failures,
// and aborted document transactions. Errors are handed to the caller as-is;
// nothing in this crate retries.

use std::time::Duration;

use keel_config::ConfigError;
use thiserror::Error;

/// Errors that can occur when interacting with a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Required configuration is missing or invalid. Fatal at startup.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// A `list` or `read` call carried no result target to decode into.
    #[error("read options carry no result target to decode into")]
    DecodeTargetMissing,

    /// An I/O error occurred in the underlying storage layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested record was not found.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Failed to serialize a payload or decode a result.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The payload shape is not one this backend can store.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A document with the same `_id` already exists.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A data operation was issued before `init` succeeded.
    #[error("backend {0} is not initialized")]
    NotInitialized(String),

    /// The storage backend is not available (e.g., database cannot be opened).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The underlying driver reported a failure while executing an operation.
    #[error("backend operation failed: {0}")]
    Backend(String),

    /// The operation did not finish within its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// A document write failed before commit; nothing was applied.
    #[error("transaction aborted: {0}")]
    TransactionAborted(#[source] Box<StorageError>),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_is_transparent() {
        let err = StorageError::from(ConfigError::invalid("URL", "document store expects a valid url"));
        assert_eq!(
            err.to_string(),
            "invalid configuration parameter URL: document store expects a valid url"
        );
    }

    #[test]
    fn test_decode_target_missing_display() {
        let err = StorageError::DecodeTargetMissing;
        assert!(err.to_string().contains("no result target"));
    }

    #[test]
    fn test_not_found_display() {
        let err = StorageError::NotFound("app/users/42".to_string());
        assert_eq!(err.to_string(), "record not found: app/users/42");
    }

    #[test]
    fn test_transaction_aborted_keeps_cause() {
        let err = StorageError::TransactionAborted(Box::new(StorageError::DuplicateKey(
            "u1".to_string(),
        )));
        assert_eq!(err.to_string(), "transaction aborted: duplicate key: u1");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "duplicate key: u1");
    }

    #[test]
    fn test_json_error_converts() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = StorageError::from(json_err);
        assert!(matches!(err, StorageError::SerializationError(_)));
    }

    #[test]
    fn test_timeout_display() {
        let err = StorageError::Timeout(Duration::from_secs(3));
        assert_eq!(err.to_string(), "operation timed out after 3s");
    }
}
