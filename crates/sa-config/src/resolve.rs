//! Configuration resolution and loading.
//!
//! Resolution order: CLI argument → `SEQAUDIT_CONFIG` → `SEQAUDIT_CONFIG_DIR`
//! → XDG config directory → built-in defaults.

use crate::audit::AuditConfig;
use crate::error::ConfigError;
use crate::snapshot::ConfigSnapshot;
use crate::validate::validate_config;
use std::path::{Path, PathBuf};

/// Where the configuration came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via `--config`.
    CliArgument,

    /// `SEQAUDIT_CONFIG` or `SEQAUDIT_CONFIG_DIR`.
    Environment,

    /// Found in the XDG config directory.
    XdgConfig,

    /// No file; built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "SEQAUDIT_CONFIG";
pub const ENV_CONFIG_DIR: &str = "SEQAUDIT_CONFIG_DIR";

/// File names looked up inside config directories, in order.
const CONFIG_FILENAMES: &[&str] = &["audit.toml", "audit.json"];

/// Application name for XDG directories.
const APP_NAME: &str = "seqaudit";

/// Resolve the config file path.
///
/// Explicit paths (CLI argument, `SEQAUDIT_CONFIG`) are returned even when
/// they do not exist so that loading reports the missing file. Directory
/// lookups only match existing files.
pub fn resolve_config_path(cli_path: Option<&Path>) -> (Option<PathBuf>, ConfigSource) {
    if let Some(path) = cli_path {
        return (Some(path.to_path_buf()), ConfigSource::CliArgument);
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
        if !env_path.is_empty() {
            return (Some(PathBuf::from(env_path)), ConfigSource::Environment);
        }
    }

    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        if let Some(path) = find_in_dir(Path::new(&config_dir)) {
            return (Some(path), ConfigSource::Environment);
        }
    }

    if let Some(path) = xdg_config_dir().and_then(|dir| find_in_dir(&dir)) {
        return (Some(path), ConfigSource::XdgConfig);
    }

    (None, ConfigSource::BuiltinDefault)
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Get the XDG config directory for seqaudit.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// A validated configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AuditConfig,
    pub source: ConfigSource,
    pub path: Option<PathBuf>,
    /// Raw file content, kept for the snapshot hash.
    pub content: Option<String>,
}

impl LoadedConfig {
    /// Snapshot of `effective`, the config actually used after any overrides.
    pub fn snapshot(&self, effective: &AuditConfig) -> ConfigSnapshot {
        ConfigSnapshot::new(
            effective,
            self.source,
            self.path.as_deref(),
            self.content.as_deref(),
        )
    }
}

/// Resolve, read, parse, and validate the audit configuration.
pub fn load_config(cli_path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let (path, source) = resolve_config_path(cli_path);
    let (config, content) = match &path {
        Some(p) => {
            let (config, content) = AuditConfig::from_file(p)?;
            (config, Some(content))
        }
        None => (AuditConfig::default(), None),
    };
    validate_config(&config)?;
    Ok(LoadedConfig {
        config,
        source,
        path,
        content,
    })
}
