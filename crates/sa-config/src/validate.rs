//! Semantic validation of audit configuration.

use crate::audit::AuditConfig;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::InvalidValue { .. } => 65,
        }
    }

    fn invalid(field: &str, message: String) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message,
        }
    }
}

/// Validate an audit configuration before any report is processed.
///
/// Requires `alpha` in (0, 1), finite `beta > 0`, and `max_iter >= 1`.
/// `beta * base_rate < 1` is checked per group once base rates are known,
/// and only for the SPRT; the e-process and LIL never reject such a group.
pub fn validate_config(config: &AuditConfig) -> ValidationResult<()> {
    validate_alpha(config.alpha)?;

    if !(config.beta.is_finite() && config.beta > 0.0) {
        return Err(ValidationError::invalid(
            "beta",
            format!("Must be a positive finite number, got {}", config.beta),
        ));
    }

    if config.max_iter == 0 {
        return Err(ValidationError::invalid(
            "max_iter",
            "Must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Check a single significance level.
pub fn validate_alpha(alpha: f64) -> ValidationResult<()> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            "alpha",
            format!("Must be in (0, 1), got {alpha}"),
        ))
    }
}
