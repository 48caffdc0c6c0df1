// SPDX-License-Identifier: PMPL-1.0-or-later
//! Keel bootstrap binary
//!
//! Loads adapter configuration from the path given as the first argument (or
//! `KEEL_CONFIG`), applies environment overrides, and initializes the
//! configured storage and cache backends. Exits non-zero if any step fails.

use keel_bootstrap::{config_path, init_tracing, Adapters};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let path = config_path(std::env::args().skip(1), |name| std::env::var(name).ok());
    match &path {
        Some(path) => tracing::info!("Loading adapter configuration from {}", path.display()),
        None => tracing::info!("No configuration file given, using defaults and environment"),
    }

    let adapters = Adapters::load(path.as_deref())
        .await
        .inspect_err(|err| tracing::error!(error = %err, "adapter initialization failed"))?;

    tracing::info!(
        "Keel adapters ready: storage={}, cache={}",
        keel_storage::StorageBackend::name(&adapters.storage),
        adapters.cache.name()
    );

    Ok(())
}
