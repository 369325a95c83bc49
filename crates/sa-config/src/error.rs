//! Configuration errors.

use crate::validate::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while selecting, loading, or validating an audit config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown method '{0}' (expected one of: eval, sprt, lil)")]
    UnknownMethod(String),

    #[error("unknown lambda rule '{0}' (expected one of: ons, agrapa)")]
    UnknownLambdaRule(String),

    #[error("unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },

    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config format '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<ConfigError> for sa_common::Error {
    fn from(err: ConfigError) -> Self {
        sa_common::Error::Config(err.to_string())
    }
}
