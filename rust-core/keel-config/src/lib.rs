// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Keel adapter configuration.
//
// Binds YAML and environment values into the typed configuration consumed by
// the storage and cache selectors. Environment variables overwrite YAML.
//
// # Modules
//
// - [`storage`] -- `StorageConfig` and the storage discriminant.
// - [`cache`] -- `CacheConfig` and the cache discriminant.
// - [`error`] -- `ConfigError`.
//
// # Example
//
// ```rust
// use keel_config::{AdapterConfig, CacheKind, StorageKind};
//
// let config = AdapterConfig::from_yaml_str(
//     "storage:\n  type: 2\ncache:\n  type: 1\n  size: 4\n",
// )
// .unwrap();
// assert_eq!(config.storage.kind(), StorageKind::Memory);
// assert_eq!(config.cache.kind(), CacheKind::Memory);
// assert_eq!(config.cache.size, 4);
// ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod cache;
mod env;
pub mod error;
pub mod storage;

pub use cache::{CacheConfig, CacheKind, DEFAULT_CACHE_SIZE_MB};
pub use error::ConfigError;
pub use storage::{StorageConfig, StorageKind};

/// Root of the adapter configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Persistence backend settings.
    pub storage: StorageConfig,
    /// Cache backend settings.
    pub cache: CacheConfig,
}

impl AdapterConfig {
    /// Parse configuration from a YAML document without env overrides or validation.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load from an optional YAML file, apply process env overrides, normalize and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    /// Like [`AdapterConfig::load`] with a custom env lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!(path = %path.display(), "loaded adapter configuration file");
                Self::from_yaml_str(&content)?
            }
            None => Self::default(),
        };

        config.storage.apply_env_with(&lookup)?;
        config.cache.apply_env_with(&lookup)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Trim string fields in both sections.
    pub fn normalize(&mut self) {
        self.storage.normalize();
        self.cache.normalize();
    }

    /// Validate both sections, storage first.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        self.cache.validate()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = AdapterConfig::from_yaml_str("").unwrap();
        assert_eq!(config, AdapterConfig::default());
        assert_eq!(config.storage.kind(), StorageKind::Noop);
        assert_eq!(config.cache.kind(), CacheKind::Memory);
        assert_eq!(config.cache.size, DEFAULT_CACHE_SIZE_MB);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = AdapterConfig::from_yaml_str("cache:\n  type: 2\n  address: redis:6379\n")
            .unwrap();
        assert_eq!(config.cache.kind(), CacheKind::Redis);
        assert_eq!(config.cache.size, DEFAULT_CACHE_SIZE_MB);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_malformed_yaml() {
        let err = AdapterConfig::from_yaml_str("storage: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_load_without_file_uses_env() {
        let config = AdapterConfig::load_with(None, |name| match name {
            "STORAGE_TYPE" => Some("2".to_string()),
            "CACHE_SIZE" => Some("32".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.storage.kind(), StorageKind::Memory);
        assert_eq!(config.cache.size, 32);
    }

    #[test]
    fn test_load_file_then_env_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "storage:\n  type: 1\n  url: \"  /var/lib/app.redb  \"\n  db: app\ncache:\n  type: 1\n  size: 2"
        )
        .unwrap();

        let config = AdapterConfig::load_with(Some(file.path()), |name| {
            (name == "STORAGE_DB").then(|| "override".to_string())
        })
        .unwrap();

        assert_eq!(config.storage.kind(), StorageKind::Document);
        assert_eq!(config.storage.url, "/var/lib/app.redb");
        assert_eq!(config.storage.db, "override");
        assert_eq!(config.cache.size, 2);
    }

    #[test]
    fn test_load_rejects_document_without_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storage:\n  type: 1\n  url: \"\"").unwrap();
        let err = AdapterConfig::load_with(Some(file.path()), no_env).unwrap_err();
        assert_eq!(err.parameter(), Some("URL"));
    }

    #[test]
    fn test_load_missing_file() {
        let err =
            AdapterConfig::load_with(Some(Path::new("/definitely/not/here.yml")), no_env)
                .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
