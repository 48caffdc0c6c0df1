// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Keel Cache
//
// A typed cache facade over interchangeable byte-level cache backends.
//
// # Modules
//
// - [`marshaler`] -- The `CacheStore` contract and the JSON `Marshaler`.
// - [`local`] -- A bounded, byte-weighted in-process cache.
// - [`remote`] -- A client for a Redis-compatible cache service.
// - [`cache`] -- The `Cache` facade and the `CacheBackend` selector.
// - [`error`] -- The `CacheError` enum.

pub mod cache;
pub mod error;
pub mod local;
pub mod marshaler;
pub mod remote;

pub use cache::{Cache, CacheBackend};
pub use error::CacheError;
pub use local::{LocalCache, DEFAULT_TTL};
pub use marshaler::{CacheStore, Marshaler, SetOptions};
pub use remote::RemoteCache;
