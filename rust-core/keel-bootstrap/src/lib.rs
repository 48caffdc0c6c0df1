// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Keel Bootstrap
//
// Builds the process-wide storage and cache handles from configuration.
// Each handle is constructed once at startup and shared for the life of the
// process; any failure here is meant to abort startup.

use std::path::{Path, PathBuf};

use keel_cache::{Cache, CacheError};
use keel_config::{AdapterConfig, ConfigError};
use keel_storage::{Storage, StorageBackend, StorageError};
use thiserror::Error;
use tracing::info;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "KEEL_CONFIG";

/// Startup failures. All of them are fatal.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("cache: {0}")]
    Cache(#[from] CacheError),
}

/// The initialized storage and cache handles.
#[derive(Debug)]
pub struct Adapters {
    pub storage: Storage,
    pub cache: Cache,
}

impl Adapters {
    /// Select and initialize both backends from an already loaded configuration.
    pub async fn build(config: &AdapterConfig) -> Result<Self, BootstrapError> {
        let storage = Storage::from_config(&config.storage).await?;
        let cache = Cache::from_config(&config.cache)?;
        info!(
            storage = storage.name(),
            cache = cache.name(),
            "adapters initialized"
        );
        Ok(Self { storage, cache })
    }

    /// Load configuration (file, then process environment) and build.
    pub async fn load(path: Option<&Path>) -> Result<Self, BootstrapError> {
        let config = AdapterConfig::load(path)?;
        Self::build(&config).await
    }

    /// Like [`Adapters::load`] with a custom env lookup.
    pub async fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, BootstrapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = AdapterConfig::load_with(path, lookup)?;
        Self::build(&config).await
    }
}

/// Pick the configuration file: the first argument, else `KEEL_CONFIG`.
pub fn config_path<I, F>(mut args: I, lookup: F) -> Option<PathBuf>
where
    I: Iterator<Item = String>,
    F: Fn(&str) -> Option<String>,
{
    args.next()
        .or_else(|| lookup(CONFIG_ENV))
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

/// Install the global tracing subscriber, honoring `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_prefers_argument() {
        let path = config_path(
            vec!["cli.yaml".to_string()].into_iter(),
            |_| Some("env.yaml".to_string()),
        );
        assert_eq!(path, Some(PathBuf::from("cli.yaml")));
    }

    #[test]
    fn test_config_path_falls_back_to_env() {
        let path = config_path(std::iter::empty(), |name| {
            (name == CONFIG_ENV).then(|| "env.yaml".to_string())
        });
        assert_eq!(path, Some(PathBuf::from("env.yaml")));
        assert_eq!(config_path(std::iter::empty(), |_| Some("  ".into())), None);
        assert_eq!(config_path(std::iter::empty(), |_| None), None);
    }

    #[tokio::test]
    async fn test_build_defaults() {
        let adapters = Adapters::build(&AdapterConfig::default()).await.unwrap();
        assert_eq!(adapters.storage.name(), "empty");
        assert_eq!(adapters.cache.name(), "memory");
    }

    #[tokio::test]
    async fn test_build_rejects_document_without_url() {
        let mut config = AdapterConfig::default();
        config.storage.kind = 1;
        let err = Adapters::build(&config).await.unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Storage(StorageError::Configuration(_))
        ));
    }
}
