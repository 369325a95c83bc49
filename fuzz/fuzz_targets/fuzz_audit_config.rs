//! Fuzz target for audit configuration parsing.
//!
//! Parses arbitrary bytes as both TOML and JSON config and validates any
//! config that parses. Must never panic, only return errors.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sa_config::{validate_config, AuditConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = serde_json::from_slice::<AuditConfig>(data) {
        let _ = validate_config(&config);
        let _ = config.algorithm_label();
    }
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = toml::from_str::<AuditConfig>(text) {
            let _ = validate_config(&config);
        }
    }
});
