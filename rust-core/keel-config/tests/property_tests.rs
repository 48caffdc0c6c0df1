// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property-based tests for discriminant decoding and env overrides

use keel_config::{AdapterConfig, CacheKind, StorageKind};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_unknown_storage_codes_fall_back_to_noop(code in any::<i64>()) {
        prop_assume!(code != 1 && code != 2);
        prop_assert_eq!(StorageKind::from_code(code), StorageKind::Noop);
    }

    #[test]
    fn test_unknown_cache_codes_fall_back_to_memory(code in any::<i64>()) {
        prop_assume!(code != 2);
        prop_assert_eq!(CacheKind::from_code(code), CacheKind::Memory);
    }

    #[test]
    fn test_env_size_overrides_yaml(yaml_size in 1u64..4096, env_size in 1u64..4096) {
        let yaml = format!("cache:\n  size: {yaml_size}\n");
        let mut config = AdapterConfig::from_yaml_str(&yaml).unwrap();
        prop_assert_eq!(config.cache.size, yaml_size);

        config
            .cache
            .apply_env_with(|name| (name == "CACHE_SIZE").then(|| env_size.to_string()))
            .unwrap();
        prop_assert_eq!(config.cache.size, env_size);
    }
}
