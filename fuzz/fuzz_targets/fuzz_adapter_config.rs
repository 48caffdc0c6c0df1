// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for adapter configuration parsing and validation

#![no_main]

use keel_config::AdapterConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parsing arbitrary YAML must fail cleanly, never panic
        if let Ok(mut config) = AdapterConfig::from_yaml_str(s) {
            config.normalize();
            let _ = config.validate();
            let _ = config.storage.kind();
            let _ = config.cache.size_bytes();
        }

        // Env values are arbitrary strings too
        let mut config = AdapterConfig::default();
        let _ = config.cache.apply_env_with(|_| Some(s.to_string()));
        let _ = config.storage.apply_env_with(|_| Some(s.to_string()));
    }
});
