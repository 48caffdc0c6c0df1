// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistence configuration.

use serde::{Deserialize, Serialize};

use crate::env::{override_parsed, override_string};
use crate::error::ConfigError;

/// Which storage backend a configuration selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Accepts every operation and stores nothing. The default.
    Noop,
    /// Transactional document store (discriminant `1`).
    Document,
    /// Process-local keyed store (discriminant `2`).
    Memory,
}

impl StorageKind {
    /// Decode a configuration discriminant. Unknown codes select [`StorageKind::Noop`].
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => StorageKind::Document,
            2 => StorageKind::Memory,
            _ => StorageKind::Noop,
        }
    }

    /// The canonical discriminant for this kind.
    pub fn code(self) -> i64 {
        match self {
            StorageKind::Noop => 0,
            StorageKind::Document => 1,
            StorageKind::Memory => 2,
        }
    }
}

/// Storage section of the adapter configuration (`storage:` in YAML).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend discriminant, see [`StorageKind::from_code`].
    #[serde(rename = "type")]
    pub kind: i64,
    /// Connection URL for the document store.
    pub url: String,
    /// Database name.
    pub db: String,
}

impl StorageConfig {
    /// The backend this configuration selects.
    pub fn kind(&self) -> StorageKind {
        StorageKind::from_code(self.kind)
    }

    /// Apply `STORAGE_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply `STORAGE_*` overrides using a custom variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_parsed(&lookup, "STORAGE_TYPE", "Type", &mut self.kind)?;
        override_string(&lookup, "STORAGE_URL", &mut self.url);
        override_string(&lookup, "STORAGE_DB", &mut self.db);
        Ok(())
    }

    /// Trim surrounding whitespace from string fields.
    pub fn normalize(&mut self) {
        self.url = self.url.trim().to_string();
        self.db = self.db.trim().to_string();
    }

    /// Check the fields the selected backend depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.kind() {
            StorageKind::Document if self.url.trim().is_empty() => Err(ConfigError::invalid(
                "URL",
                "document store expects a valid url",
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminants() {
        assert_eq!(StorageKind::from_code(0), StorageKind::Noop);
        assert_eq!(StorageKind::from_code(1), StorageKind::Document);
        assert_eq!(StorageKind::from_code(2), StorageKind::Memory);
        assert_eq!(StorageKind::from_code(-3), StorageKind::Noop);
        assert_eq!(StorageKind::from_code(99), StorageKind::Noop);
        for kind in [StorageKind::Noop, StorageKind::Document, StorageKind::Memory] {
            assert_eq!(StorageKind::from_code(kind.code()), kind);
        }
    }

    #[test]
    fn test_default_is_noop() {
        let config = StorageConfig::default();
        assert_eq!(config.kind(), StorageKind::Noop);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_document_requires_url() {
        let config = StorageConfig {
            kind: 1,
            url: "   ".to_string(),
            db: "app".to_string(),
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.parameter(), Some("URL"));
    }

    #[test]
    fn test_noop_and_memory_accept_empty_url() {
        for kind in [0, 2, 17] {
            let config = StorageConfig {
                kind,
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "kind {kind} should not need a url");
        }
    }

    #[test]
    fn test_normalize_trims() {
        let mut config = StorageConfig {
            kind: 1,
            url: "  redb:///tmp/app.redb \n".to_string(),
            db: " app ".to_string(),
        };
        config.normalize();
        assert_eq!(config.url, "redb:///tmp/app.redb");
        assert_eq!(config.db, "app");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = StorageConfig::default();
        config
            .apply_env_with(|name| match name {
                "STORAGE_TYPE" => Some("1".to_string()),
                "STORAGE_URL" => Some("/data/app.redb".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.kind(), StorageKind::Document);
        assert_eq!(config.url, "/data/app.redb");
        assert_eq!(config.db, "");
    }

    #[test]
    fn test_env_type_must_be_numeric() {
        let mut config = StorageConfig::default();
        let err = config
            .apply_env_with(|name| (name == "STORAGE_TYPE").then(|| "mongo".to_string()))
            .unwrap_err();
        assert_eq!(err.parameter(), Some("Type"));
    }
}
