// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cache error types.
//
// A miss is an error value, not an empty success. Driver errors are passed
// through unchanged; nothing here retries.

use keel_config::ConfigError;
use thiserror::Error;

/// Errors returned by cache stores and the cache facade.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The key is absent or its entry has expired.
    #[error("cache miss for key {key:?}")]
    Miss {
        /// The key that was looked up.
        key: String,
    },

    /// The payload could not be encoded, or cached bytes could not be decoded.
    #[error("cache codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The remote cache service reported a failure.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Required configuration is missing or invalid. Fatal at startup.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl CacheError {
    pub(crate) fn miss(key: impl Into<String>) -> Self {
        CacheError::Miss { key: key.into() }
    }

    /// Whether this error signals a cache miss.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss { .. })
    }
}
