// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The configured storage backend, chosen once at startup.

use async_trait::async_trait;
use keel_config::{StorageConfig, StorageKind};
use tracing::info;

use crate::backend::{BackendCapabilities, StorageBackend, StoreOptions};
use crate::document::DocumentBackend;
use crate::error::StorageError;
use crate::memory::InMemoryBackend;
use crate::noop::NoopBackend;
use crate::options::{DeleteOptions, ReadOptions, WriteOptions};
use crate::record::Payload;

/// One of the storage variants, dispatched through [`StorageBackend`].
#[derive(Debug)]
pub enum Storage {
    Memory(InMemoryBackend),
    Document(DocumentBackend),
    Noop(NoopBackend),
}

impl Storage {
    /// An uninitialized backend of the given kind.
    pub fn for_kind(kind: StorageKind) -> Self {
        match kind {
            StorageKind::Memory => Storage::Memory(InMemoryBackend::new()),
            StorageKind::Document => Storage::Document(DocumentBackend::new()),
            StorageKind::Noop => Storage::Noop(NoopBackend::new()),
        }
    }

    /// Validate `config`, construct the backend it selects and initialize it.
    ///
    /// A document configuration without a URL fails here with
    /// [`StorageError::Configuration`] naming `URL`. Unknown discriminants
    /// select the no-op backend.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        config.validate()?;
        let mut storage = Self::for_kind(config.kind());
        storage
            .init(
                StoreOptions::new()
                    .node(config.url.trim())
                    .database(config.db.trim()),
            )
            .await?;
        info!(backend = storage.name(), database = %config.db.trim(), "storage ready");
        Ok(storage)
    }

    fn inner(&self) -> &dyn StorageBackend {
        match self {
            Storage::Memory(b) => b,
            Storage::Document(b) => b,
            Storage::Noop(b) => b,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn StorageBackend {
        match self {
            Storage::Memory(b) => b,
            Storage::Document(b) => b,
            Storage::Noop(b) => b,
        }
    }
}

#[async_trait]
impl StorageBackend for Storage {
    async fn init(&mut self, options: StoreOptions) -> Result<(), StorageError> {
        self.inner_mut().init(options).await
    }

    async fn list(&self, options: ReadOptions<'_>) -> Result<(), StorageError> {
        self.inner().list(options).await
    }

    async fn read(&self, options: ReadOptions<'_>) -> Result<(), StorageError> {
        self.inner().read(options).await
    }

    async fn write(&self, payload: Payload, options: WriteOptions) -> Result<(), StorageError> {
        self.inner().write(payload, options).await
    }

    async fn update(&self, payload: Payload, options: WriteOptions) -> Result<(), StorageError> {
        self.inner().update(payload, options).await
    }

    async fn delete(&self, options: DeleteOptions) -> Result<(), StorageError> {
        self.inner().delete(options).await
    }

    fn options(&self) -> StoreOptions {
        self.inner().options()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.inner().capabilities()
    }
}
