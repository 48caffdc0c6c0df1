// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Storage backend that accepts every call and keeps nothing.

use async_trait::async_trait;

use crate::backend::{BackendCapabilities, StorageBackend, StoreOptions};
use crate::error::StorageError;
use crate::options::{DeleteOptions, ReadOptions, WriteOptions};
use crate::record::Payload;

/// Selected when no storage is configured. Every operation succeeds and
/// result targets are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackend;

impl NoopBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StorageBackend for NoopBackend {
    async fn init(&mut self, _options: StoreOptions) -> Result<(), StorageError> {
        Ok(())
    }

    async fn list(&self, _options: ReadOptions<'_>) -> Result<(), StorageError> {
        Ok(())
    }

    async fn read(&self, _options: ReadOptions<'_>) -> Result<(), StorageError> {
        Ok(())
    }

    async fn write(&self, _payload: Payload, _options: WriteOptions) -> Result<(), StorageError> {
        Ok(())
    }

    async fn update(&self, _payload: Payload, _options: WriteOptions) -> Result<(), StorageError> {
        Ok(())
    }

    async fn delete(&self, _options: DeleteOptions) -> Result<(), StorageError> {
        Ok(())
    }

    fn options(&self) -> StoreOptions {
        StoreOptions::default()
    }

    fn name(&self) -> &str {
        "empty"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::default()
    }
}
