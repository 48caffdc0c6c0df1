// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Byte-level cache contract and the marshaling layer on top of it.
//
// `CacheStore` is what each cache variant implements: opaque bytes in, opaque
// bytes out. `Marshaler` turns typed values into those bytes (JSON) so call
// sites never see the wire representation.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CacheError;

/// A key/value cache holding opaque bytes.
///
/// Keys are global to the store. `set` overwrites any existing entry and
/// resets its expiry. `get` on an absent or expired key returns
/// [`CacheError::Miss`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError>;

    /// Store `value` under `key`. `None` or a zero `ttl` selects the store's default.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
        -> Result<(), CacheError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// A short label for logging.
    fn name(&self) -> &str;
}

/// Per-call options for [`Marshaler::set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// How long the entry lives.
    pub expiration: Option<Duration>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expiration(mut self, ttl: Duration) -> Self {
        self.expiration = Some(ttl);
        self
    }
}

/// Serializes typed values into a [`CacheStore`].
#[derive(Debug, Clone)]
pub struct Marshaler<S> {
    store: S,
}

impl<S: CacheStore> Marshaler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encode `value` and store it under `key`.
    pub async fn set<T>(&self, key: &str, value: &T, options: SetOptions) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, bytes, options.expiration).await
    }

    /// Fetch and decode the value stored under `key`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        let bytes = self.store.get(key).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.delete(key).await
    }
}
