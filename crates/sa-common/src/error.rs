//! Error types for seqaudit.
//!
//! Every failure carries:
//! - a stable numeric code for machine parsing
//! - a category for grouping
//! - a recoverability hint and suggested action for automation
//! - a remediation line for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Missing Report Feature
//!   Reason: report 17 has no feature 'race' required by group 3
//!   Fix: Every feature named in groups.json must be present in every report row.
//! ```
//!
//! # Machine-Facing Output
//!
//! ```json
//! {
//!   "code": 20,
//!   "category": "input",
//!   "message": "report 17 has no feature 'race' required by group 3",
//!   "recoverable": true,
//!   "suggested_action": "fix_input",
//!   "context": { "feature": "race", "group": 3, "report": 17 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for seqaudit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Audit configuration errors (thresholds, method selectors, files).
    Config,
    /// Malformed reports, groups, or base rates.
    Input,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for automation reacting to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Retry the operation.
    Retry,
    /// Run `seqaudit config validate`.
    RunCheck,
    /// Correct the input files and rerun.
    FixInput,
    /// Manual intervention required.
    ManualIntervention,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
        }
    }
}

/// Unified error type for seqaudit.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    // Input errors (20-29)
    #[error("report {report} has no feature '{feature}' required by group {group}")]
    MissingFeature {
        feature: String,
        group: usize,
        report: usize,
    },

    #[error("group list has {groups} entries but base-rate vector has {base_rates}")]
    LengthMismatch { groups: usize, base_rates: usize },

    #[error("base rate {value} for group {group} is outside (0, 1)")]
    InvalidBaseRate { group: usize, value: f64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::MissingFeature { .. } => 20,
            Error::LengthMismatch { .. } => 21,
            Error::InvalidBaseRate { .. } => 22,
            Error::InvalidInput(_) => 23,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,
            Error::MissingFeature { .. }
            | Error::LengthMismatch { .. }
            | Error::InvalidBaseRate { .. }
            | Error::InvalidInput(_) => ErrorCategory::Input,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether rerunning after a fix can succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::MissingFeature { .. } => true,
            Error::LengthMismatch { .. } => true,
            Error::InvalidBaseRate { .. } => true,
            Error::InvalidInput(_) => true,
            Error::Io(_) => true,
            // Malformed JSON needs a human to look at the file
            Error::Json(_) => false,
        }
    }

    /// Returns the suggested action for automation.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::MissingFeature { .. }
            | Error::LengthMismatch { .. }
            | Error::InvalidBaseRate { .. }
            | Error::InvalidInput(_) => SuggestedAction::FixInput,
            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::ManualIntervention,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'seqaudit config validate' to check the configuration, or pass --preset standard."
            }
            Error::MissingFeature { .. } => {
                "Every feature named in groups.json must be present in every report row."
            }
            Error::LengthMismatch { .. } => {
                "base_rates.json must hold exactly one rate per entry in groups.json, in the same order."
            }
            Error::InvalidBaseRate { .. } => {
                "Base rates are probabilities; each must be strictly between 0 and 1."
            }
            Error::InvalidInput(_) => {
                "Reports and groups must be JSON arrays of objects mapping feature names to strings, integers, or booleans."
            }
            Error::Io(_) => "Check that the input paths exist and are readable, then retry.",
            Error::Json(_) => "Invalid JSON in file. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::MissingFeature { .. } => "Missing Report Feature",
            Error::LengthMismatch { .. } => "Group / Base-Rate Length Mismatch",
            Error::InvalidBaseRate { .. } => "Invalid Base Rate",
            Error::InvalidInput(_) => "Invalid Input",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for automation.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (feature name, group index, ...).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::MissingFeature {
                feature,
                group,
                report,
            } => {
                context.insert("feature".to_string(), serde_json::json!(feature));
                context.insert("group".to_string(), serde_json::json!(group));
                context.insert("report".to_string(), serde_json::json!(report));
            }
            Error::LengthMismatch { groups, base_rates } => {
                context.insert("groups".to_string(), serde_json::json!(groups));
                context.insert("base_rates".to_string(), serde_json::json!(base_rates));
            }
            Error::InvalidBaseRate { group, value } => {
                context.insert("group".to_string(), serde_json::json!(group));
                context.insert("value".to_string(), serde_json::json!(value));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
