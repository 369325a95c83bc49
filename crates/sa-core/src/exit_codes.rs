//! Exit codes for the seqaudit CLI.
//!
//! Exit codes communicate the audit outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-1: Audit outcomes
//! - 10-19: User errors (fix arguments, configuration, or input files)
//! - 20-29: Internal and I/O errors

use sa_common::{Error, ErrorCategory};

/// Exit codes for seqaudit operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Audit completed with no rejected group
    Clean = 0,

    /// At least one group was rejected
    Flagged = 1,

    /// Invalid arguments
    ArgsError = 10,

    /// Invalid or unreadable configuration
    ConfigError = 11,

    /// Malformed reports, groups, or base rates
    InputError = 12,

    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates any error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Flagged => "OK_FLAGGED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Exit code for a failed command.
    pub fn from_error(err: &Error) -> Self {
        match err {
            // A malformed input file, not a failing disk
            Error::Json(_) => ExitCode::InputError,
            _ => match err.category() {
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::Input => ExitCode::InputError,
                ErrorCategory::Io => ExitCode::IoError,
            },
        }
    }

    /// Exit code for a completed audit.
    pub fn from_flagged(flagged: bool) -> Self {
        if flagged {
            ExitCode::Flagged
        } else {
            ExitCode::Clean
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::Flagged.as_i32(), 1);
        assert_eq!(ExitCode::ArgsError.as_i32(), 10);
        assert_eq!(ExitCode::ConfigError.as_i32(), 11);
        assert_eq!(ExitCode::InputError.as_i32(), 12);
        assert_eq!(ExitCode::InternalError.as_i32(), 20);
        assert_eq!(i32::from(ExitCode::IoError), 21);
    }

    #[test]
    fn outcomes_are_not_errors() {
        assert!(!ExitCode::Clean.is_error());
        assert!(!ExitCode::Flagged.is_error());
        assert!(ExitCode::ArgsError.is_error());
        assert!(ExitCode::InternalError.is_error());
    }

    #[test]
    fn error_mapping() {
        assert_eq!(
            ExitCode::from_error(&Error::Config("bad".into())),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::from_error(&Error::InvalidBaseRate { group: 0, value: 2.0 }),
            ExitCode::InputError
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(ExitCode::from_error(&Error::Io(io)), ExitCode::IoError);
        let json = serde_json::from_str::<Vec<f64>>("[").unwrap_err();
        assert_eq!(ExitCode::from_error(&Error::Json(json)), ExitCode::InputError);
    }

    #[test]
    fn display_includes_name() {
        assert_eq!(ExitCode::Flagged.to_string(), "OK_FLAGGED (1)");
        assert_eq!(ExitCode::from_flagged(false), ExitCode::Clean);
    }
}
