//! Audit configuration and test selectors.

use crate::error::ConfigError;
use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Sequential test procedure driving an audit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Adaptively-bet e-process (log-wealth capital process)
    #[default]
    Eval,
    /// Sequential probability ratio test on match counts
    Sprt,
    /// Law-of-iterated-logarithm boundary on match counts
    Lil,
}

impl Method {
    pub const ALL: &'static [Method] = &[Method::Eval, Method::Sprt, Method::Lil];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Eval => "eval",
            Method::Sprt => "sprt",
            Method::Lil => "lil",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "eval" => Ok(Method::Eval),
            "sprt" => Ok(Method::Sprt),
            "lil" => Ok(Method::Lil),
            _ => Err(ConfigError::UnknownMethod(s.to_string())),
        }
    }
}

/// Online estimator for the betting fraction of the e-process.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LambdaRule {
    /// Online Newton Step
    #[default]
    Ons,
    /// Approximate growth-rate adaptive plug-in
    Agrapa,
}

impl LambdaRule {
    pub const ALL: &'static [LambdaRule] = &[LambdaRule::Ons, LambdaRule::Agrapa];

    pub fn as_str(&self) -> &'static str {
        match self {
            LambdaRule::Ons => "ons",
            LambdaRule::Agrapa => "agrapa",
        }
    }
}

impl fmt::Display for LambdaRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LambdaRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ons" => Ok(LambdaRule::Ons),
            "agrapa" => Ok(LambdaRule::Agrapa),
            _ => Err(ConfigError::UnknownLambdaRule(s.to_string())),
        }
    }
}

/// Parameters of one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Family-wise false-alarm level, in (0, 1).
    pub alpha: f64,

    /// Multiplier on base rates defining the null report rate `beta * base_rate`.
    pub beta: f64,

    /// Maximum number of reports consumed.
    pub max_iter: u64,

    /// Test procedure.
    pub method: Method,

    /// Betting-fraction estimator (only used by `eval`).
    pub lambda_rule: LambdaRule,

    /// Use the variance-scaled LIL boundary (only used by `lil`).
    pub asymptotic: bool,

    /// Stop at the first corrected crossing and report a single group.
    pub stop_at_first: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            beta: 1.5,
            max_iter: 20_000,
            method: Method::Eval,
            lambda_rule: LambdaRule::Ons,
            asymptotic: false,
            stop_at_first: false,
        }
    }
}

/// Supported on-disk config formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Detect the format from a file extension.
    pub fn detect(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(ConfigError::UnsupportedFormat(ext)),
        }
    }
}

impl AuditConfig {
    /// Parse a config document. Missing fields take their defaults.
    pub fn parse_str(content: &str, format: ConfigFormat, path: &Path) -> Result<Self, ConfigError> {
        let parsed = match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Read and parse a config file, returning the config and the raw content.
    pub fn from_file(path: &Path) -> Result<(Self, String), ConfigError> {
        let format = ConfigFormat::detect(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::parse_str(&content, format, path)?;
        Ok((config, content))
    }

    /// Null report rate for a group with the given base rate.
    pub fn null_rate(&self, base_rate: f64) -> f64 {
        self.beta * base_rate
    }

    /// Short label used in logs and trial rows, e.g. `eval-ons` or `lil-asymptotic`.
    pub fn algorithm_label(&self) -> String {
        match self.method {
            Method::Eval => format!("eval-{}", self.lambda_rule),
            Method::Sprt => "sprt".to_string(),
            Method::Lil if self.asymptotic => "lil-asymptotic".to_string(),
            Method::Lil => "lil".to_string(),
        }
    }
}
