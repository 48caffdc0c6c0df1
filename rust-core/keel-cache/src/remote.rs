// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Remote cache on a Redis-compatible service.
//
// Every call is a network round trip through a `ConnectionManager`, which
// handles reconnects. The connection is opened on first use, so building a
// `RemoteCache` never touches the network. A zero TTL stores without expiry.

use std::time::Duration;

use async_trait::async_trait;
use keel_config::{CacheConfig, ConfigError};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use crate::error::CacheError;
use crate::marshaler::CacheStore;

/// Thin client over a remote key/value cache.
pub struct RemoteCache {
    client: redis::Client,
    endpoint: String,
    connection: OnceCell<ConnectionManager>,
}

impl RemoteCache {
    /// Build a client for `config`. No connection is made yet.
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let url = connection_url(config)?;
        let client = redis::Client::open(url.as_str())?;
        Ok(Self {
            client,
            endpoint: config.address.trim().to_string(),
            connection: OnceCell::new(),
        })
    }

    /// `host:port` this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let manager = ConnectionManager::new(self.client.clone()).await?;
                info!(endpoint = %self.endpoint, "connected to remote cache");
                Ok::<_, CacheError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

impl std::fmt::Debug for RemoteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCache")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

/// Build the `redis://[user[:password]@]host:port/db` connection URL.
pub fn connection_url(config: &CacheConfig) -> Result<Url, CacheError> {
    let address = config.address.trim();
    let (scheme, host) = match address.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("redis", address),
    };
    let invalid = |reason: String| CacheError::from(ConfigError::invalid("Address", reason));

    let mut url = Url::parse(&format!("{scheme}://{host}"))
        .map_err(|e| invalid(format!("cannot parse redis address {address:?}: {e}")))?;
    url.set_path(&format!("/{}", config.database));
    if !config.username.is_empty() {
        url.set_username(&config.username)
            .map_err(|_| invalid(format!("redis address {address:?} cannot carry a username")))?;
    }
    if !config.password.is_empty() {
        url.set_password(Some(&config.password))
            .map_err(|_| invalid(format!("redis address {address:?} cannot carry a password")))?;
    }
    Ok(url)
}

#[async_trait]
impl CacheStore for RemoteCache {
    async fn get(&self, key: &str) -> Result<Vec<u8>, CacheError> {
        let mut conn = self.connection().await?;
        let found: Option<Vec<u8>> = conn.get(key).await?;
        found.ok_or_else(|| CacheError::miss(key))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        match ttl.and_then(expire_millis) {
            Some(millis) => {
                let _: () = conn.pset_ex(key, value, millis).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        debug!(key, "remote cache set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}

/// Expiry in whole milliseconds for `PSETEX`, rounded up so sub-millisecond
/// ttls still expire. `None` for a zero ttl, which stores without expiry.
fn expire_millis(ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        return None;
    }
    let millis = ttl.as_nanos().div_ceil(1_000_000);
    Some(u64::try_from(millis).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(address: &str) -> CacheConfig {
        CacheConfig {
            kind: 2,
            address: address.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_expire_millis_rounds_up() {
        assert_eq!(expire_millis(Duration::ZERO), None);
        assert_eq!(expire_millis(Duration::from_nanos(1)), Some(1));
        assert_eq!(expire_millis(Duration::from_micros(500)), Some(1));
        assert_eq!(expire_millis(Duration::from_micros(1500)), Some(2));
        assert_eq!(expire_millis(Duration::from_secs(2)), Some(2000));
        assert_eq!(expire_millis(Duration::MAX), Some(u64::MAX));
    }

    #[test]
    fn test_connection_url_plain() {
        let url = connection_url(&config("127.0.0.1:6379")).unwrap();
        assert_eq!(url.as_str(), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn test_connection_url_with_credentials_and_database() {
        let cfg = CacheConfig {
            username: "svc".into(),
            password: "p@ss word".into(),
            database: 3,
            ..config(" cache.internal:6380 ")
        };
        let url = connection_url(&cfg).unwrap();
        assert_eq!(url.scheme(), "redis");
        assert_eq!(url.username(), "svc");
        assert_eq!(url.password(), Some("p%40ss%20word"));
        assert_eq!(url.host_str(), Some("cache.internal"));
        assert_eq!(url.port(), Some(6380));
        assert_eq!(url.path(), "/3");
    }

    #[test]
    fn test_connection_url_keeps_tls_scheme() {
        let url = connection_url(&config("rediss://secure.example:6379")).unwrap();
        assert_eq!(url.scheme(), "rediss");
    }

    #[test]
    fn test_connection_url_rejects_garbage() {
        let err = connection_url(&config("cache.internal:notaport")).unwrap_err();
        match err {
            CacheError::Configuration(cfg) => assert_eq!(cfg.parameter(), Some("Address")),
            other => panic!("expected Configuration, got: {:?}", other),
        }
    }

    #[test]
    fn test_new_is_lazy() {
        // Nothing listens here; construction must still succeed.
        let cache = RemoteCache::new(&config("127.0.0.1:1")).unwrap();
        assert_eq!(cache.endpoint(), "127.0.0.1:1");
        assert_eq!(cache.name(), "redis");
        assert!(format!("{:?}", cache).contains("connected: false"));
    }
}
