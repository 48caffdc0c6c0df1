// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cache configuration.

use serde::{Deserialize, Serialize};

use crate::env::{override_parsed, override_string};
use crate::error::ConfigError;

/// Default local cache buffer size, in megabytes.
pub const DEFAULT_CACHE_SIZE_MB: u64 = 10;

/// Which cache backend a configuration selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Bounded in-process cache (discriminant `1`, the default).
    Memory,
    /// Remote key-value cache service (discriminant `2`).
    Redis,
}

impl CacheKind {
    /// Decode a configuration discriminant. Unknown codes select [`CacheKind::Memory`].
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => CacheKind::Redis,
            _ => CacheKind::Memory,
        }
    }

    /// The canonical discriminant for this kind.
    pub fn code(self) -> i64 {
        match self {
            CacheKind::Memory => 1,
            CacheKind::Redis => 2,
        }
    }
}

/// Cache section of the adapter configuration (`cache:` in YAML).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend discriminant, see [`CacheKind::from_code`].
    #[serde(rename = "type")]
    pub kind: i64,
    /// Local cache buffer size in megabytes. `0` selects [`DEFAULT_CACHE_SIZE_MB`].
    pub size: u64,
    /// Remote cache address, `host:port`.
    pub address: String,
    /// Remote cache username.
    pub username: String,
    /// Remote cache password.
    pub password: String,
    /// Remote cache database index.
    pub database: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: CacheKind::Memory.code(),
            size: DEFAULT_CACHE_SIZE_MB,
            address: String::new(),
            username: String::new(),
            password: String::new(),
            database: 0,
        }
    }
}

impl CacheConfig {
    /// The backend this configuration selects.
    pub fn kind(&self) -> CacheKind {
        CacheKind::from_code(self.kind)
    }

    /// Local buffer capacity in bytes.
    pub fn size_bytes(&self) -> u64 {
        let size = if self.size == 0 {
            DEFAULT_CACHE_SIZE_MB
        } else {
            self.size
        };
        size.saturating_mul(1024 * 1024)
    }

    /// Apply `CACHE_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply `CACHE_*` overrides using a custom variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_parsed(&lookup, "CACHE_TYPE", "Type", &mut self.kind)?;
        override_parsed(&lookup, "CACHE_SIZE", "Size", &mut self.size)?;
        override_string(&lookup, "CACHE_ADDRESS", &mut self.address);
        override_string(&lookup, "CACHE_USERNAME", &mut self.username);
        override_string(&lookup, "CACHE_PASSWORD", &mut self.password);
        override_parsed(&lookup, "CACHE_DATABASE", "Database", &mut self.database)?;
        Ok(())
    }

    /// Trim the address and fill in an unset buffer size. Credentials are taken verbatim.
    pub fn normalize(&mut self) {
        self.address = self.address.trim().to_string();
        if self.size == 0 {
            self.size = DEFAULT_CACHE_SIZE_MB;
        }
    }

    /// Check the fields the selected backend depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.kind() {
            CacheKind::Redis => {
                if self.address.trim().is_empty() {
                    return Err(ConfigError::invalid(
                        "Address",
                        "redis cache must have a valid address",
                    ));
                }
                if self.database < 0 {
                    return Err(ConfigError::invalid(
                        "Database",
                        "redis database index cannot be negative",
                    ));
                }
                Ok(())
            }
            CacheKind::Memory => Ok(()),
        }
    }
}
