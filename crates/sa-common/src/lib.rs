//! seqaudit common types, IDs, and errors.
//!
//! This crate provides the vocabulary shared by the config and core crates:
//! - Report, group, and base-rate data model
//! - Rejection table types produced by an audit
//! - Unified error type with stable codes
//! - Output format specifications
//! - Run identifiers

pub mod error;
pub mod id;
pub mod model;
pub mod output;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use id::RunId;
pub use model::{
    BaseRates, FeatureValue, Group, GroupId, RejectionRecord, RejectionTable, Report,
};
pub use output::OutputFormat;
