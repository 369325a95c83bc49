//! seqaudit core library
//!
//! Sequential multi-hypothesis auditing of report streams:
//! - Group matching and online betting-fraction estimation
//! - Three sequential test engines (e-process, SPRT, LIL boundary)
//! - The orchestrator that records rejections under a family-wise guarantee
//! - Input loading, the permuted-trial harness, and the offline oracle
//! - Logging, exit codes, and output rendering for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod audit;
pub mod engine;
pub mod exit_codes;
pub mod input;
pub mod lambda;
pub mod logging;
pub mod matcher;
pub mod oracle;
pub mod output;
pub mod trial;

pub use audit::{drive, run_audit, AuditOutcome, AuditRun, StepOutcome};
pub use engine::Engine;
pub use input::InputBundle;
pub use lambda::LambdaEstimator;
pub use matcher::GroupMatcher;
