//! Named configuration presets.
//!
//! - Standard: reference parameters (alpha 0.05, beta 1.5, ONS e-process)
//! - Conservative: fewer false alarms, larger effect required
//! - Sensitive: catches smaller excesses sooner at a looser alpha
//! - Screening: first-alarm LIL sweep for a quick yes/no answer

use crate::audit::{AuditConfig, LambdaRule, Method};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Standard,
    Conservative,
    Sensitive,
    Screening,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[
        PresetName::Standard,
        PresetName::Conservative,
        PresetName::Sensitive,
        PresetName::Screening,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Standard => "standard",
            PresetName::Conservative => "conservative",
            PresetName::Sensitive => "sensitive",
            PresetName::Screening => "screening",
        }
    }

    /// Parse preset name from string, accepting a few aliases.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Some(PresetName::Standard),
            "conservative" | "strict" => Some(PresetName::Conservative),
            "sensitive" => Some(PresetName::Sensitive),
            "screening" | "screen" | "quick" => Some(PresetName::Screening),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Standard => "alpha 0.05, beta 1.5, e-process with ONS betting",
            PresetName::Conservative => "alpha 0.01, beta 2.0, e-process with ONS betting",
            PresetName::Sensitive => "alpha 0.1, beta 1.2, e-process with AGRAPA betting",
            PresetName::Screening => "alpha 0.1, beta 1.5, asymptotic LIL, stop at first alarm",
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| ConfigError::UnknownPreset {
            name: s.to_string(),
            available: PresetName::ALL
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Build the configuration for a preset.
pub fn get_preset(name: PresetName) -> AuditConfig {
    let base = AuditConfig::default();
    match name {
        PresetName::Standard => base,
        PresetName::Conservative => AuditConfig {
            alpha: 0.01,
            beta: 2.0,
            ..base
        },
        PresetName::Sensitive => AuditConfig {
            alpha: 0.1,
            beta: 1.2,
            lambda_rule: LambdaRule::Agrapa,
            ..base
        },
        PresetName::Screening => AuditConfig {
            alpha: 0.1,
            method: Method::Lil,
            asymptotic: true,
            stop_at_first: true,
            ..base
        },
    }
}
