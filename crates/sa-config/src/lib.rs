//! seqaudit configuration loading and validation.
//!
//! This crate provides:
//! - The typed [`AuditConfig`] and its method / lambda-rule selectors
//! - Named presets
//! - Config resolution (CLI → env → XDG → defaults) and TOML/JSON loading
//! - Semantic validation
//! - Config snapshots recorded alongside audit output

pub mod audit;
pub mod error;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use audit::{AuditConfig, LambdaRule, Method};
pub use error::ConfigError;
pub use preset::{get_preset, PresetName};
pub use resolve::{load_config, resolve_config_path, ConfigSource, LoadedConfig};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_alpha, validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
