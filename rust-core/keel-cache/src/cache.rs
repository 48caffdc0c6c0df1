// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cache facade and the configured cache backend.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keel_config::{CacheConfig, CacheKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::error::CacheError;
use crate::local::LocalCache;
use crate::marshaler::{CacheStore, Marshaler, SetOptions};
use crate::remote::RemoteCache;

/// One of the cache variants, dispatched through [`CacheStore`].
#[derive(Debug)]
pub enum CacheBackend {
    Local(LocalCache),
    Remote(RemoteCache),
}

impl CacheBackend {
    fn inner(&self) -> &dyn CacheStore {
        match self {
            CacheBackend::Local(c) => c,
            CacheBackend::Remote(c) => c,
        }
    }
}

#[async_trait]
impl CacheStore for CacheBackend {
    async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        self.inner().get(key).await
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.inner().set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner().delete(key).await
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

/// Typed get/put/delete over the configured cache backend.
///
/// Values are marshaled to JSON before they reach the backend, so any
/// `Serialize`/`DeserializeOwned` type can be cached.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use keel_cache::{Cache, LocalCache};
///
/// # tokio_test::block_on(async {
/// let cache = Cache::new(LocalCache::with_capacity(1024 * 1024).into());
/// cache.put("answer", &42u32, Duration::from_secs(5)).await.unwrap();
///
/// let (answer, _at): (u32, _) = cache.get("answer").await.unwrap();
/// assert_eq!(answer, 42);
///
/// cache.delete("answer").await.unwrap();
/// assert!(cache.get::<u32>("answer").await.unwrap_err().is_miss());
/// # });
/// ```
#[derive(Debug)]
pub struct Cache {
    marshaler: Marshaler<CacheBackend>,
}

impl Cache {
    pub fn new(backend: CacheBackend) -> Self {
        Self {
            marshaler: Marshaler::new(backend),
        }
    }

    /// Validate `config` and build the backend it selects.
    ///
    /// A remote selection without an address fails here with
    /// [`CacheError::Configuration`] naming `Address`. Unknown discriminants
    /// select the local cache. The remote connection is opened on first use.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        let backend = match config.kind() {
            CacheKind::Memory => {
                CacheBackend::Local(LocalCache::with_capacity(config.size_bytes()))
            }
            CacheKind::Redis => CacheBackend::Remote(RemoteCache::new(config)?),
        };
        info!(backend = backend.name(), "cache ready");
        Ok(Self::new(backend))
    }

    /// The selected backend.
    pub fn backend(&self) -> &CacheBackend {
        self.marshaler.store()
    }

    pub fn name(&self) -> &str {
        self.backend().name()
    }

    /// Fetch the value under `key`, with the time it was read.
    ///
    /// Absent or expired keys return [`CacheError::Miss`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<(T, DateTime<Utc>), CacheError> {
        let value = self.marshaler.get(key).await?;
        Ok((value, Utc::now()))
    }

    /// Store `value` under `key`, replacing any existing entry and its TTL.
    ///
    /// A zero `ttl` selects the backend default: 10 seconds for the local
    /// cache, no expiry for the remote one.
    pub async fn put<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized + Sync,
    {
        self.marshaler
            .set(key, value, SetOptions::new().expiration(ttl))
            .await
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.marshaler.delete(key).await
    }
}

impl From<LocalCache> for CacheBackend {
    fn from(cache: LocalCache) -> Self {
        CacheBackend::Local(cache)
    }
}

impl From<RemoteCache> for CacheBackend {
    fn from(cache: RemoteCache) -> Self {
        CacheBackend::Remote(cache)
    }
}
