// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded in-process cache on moka.
//
// Capacity is a byte budget: every entry weighs its key length plus its value
// length, and moka evicts the least useful entries once the budget is spent.
// Each entry carries its own time to live, applied on insert and reset on
// overwrite.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use tracing::debug;

use crate::error::CacheError;
use crate::marshaler::CacheStore;

/// Time to live used when a call does not supply one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct Entry {
    bytes: Arc<[u8]>,
    ttl: Duration,
}

struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _at: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

fn weigh(key: &String, entry: &Entry) -> u32 {
    u32::try_from(key.len() + entry.bytes.len()).unwrap_or(u32::MAX)
}

/// A bounded, byte-weighted local cache.
///
/// Clones share the same underlying cache.
#[derive(Clone)]
pub struct LocalCache {
    inner: Cache<String, Entry>,
    capacity: u64,
    default_ttl: Duration,
}

impl LocalCache {
    /// A cache holding at most `capacity_bytes` of keys and values.
    pub fn with_capacity(capacity_bytes: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity_bytes)
            .weigher(weigh)
            .expire_after(EntryTtl)
            .build();
        Self {
            inner,
            capacity: capacity_bytes,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Replace the default time to live.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        if !ttl.is_zero() {
            self.default_ttl = ttl;
        }
        self
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Approximate bytes in use.
    pub fn weighted_size(&self) -> u64 {
        self.inner.weighted_size()
    }

    /// Apply pending evictions and expirations now.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    fn resolve_ttl(&self, ttl: Option<Duration>) -> Duration {
        ttl.filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.default_ttl)
    }
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheStore for LocalCache {
    async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        match self.inner.get(key).await {
            Some(entry) => Ok(entry.bytes.to_vec()),
            None => Err(CacheError::miss(key)),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let ttl = self.resolve_ttl(ttl);
        debug!(key, bytes = value.len(), ttl_ms = ttl.as_millis() as u64, "local cache set");
        self.inner
            .insert(
                key.to_string(),
                Entry {
                    bytes: value.into(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
