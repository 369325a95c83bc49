//! Sequential test engines.
//!
//! All three engines keep one statistic per group in a flat array and expose
//! the same surface to the orchestrator: advance one report, read the
//! statistics, and read the thresholds in force after the last step.

pub mod capital;
pub mod lil;
pub mod sprt;

pub use capital::CapitalEngine;
pub use lil::LilEngine;
pub use sprt::SprtEngine;

use sa_config::{AuditConfig, Method};
use sa_math::{bonferroni_log_threshold, uncorrected_log_threshold};

/// A sequential test over every group at once.
#[derive(Debug, Clone)]
pub enum Engine {
    Capital(CapitalEngine),
    Sprt(SprtEngine),
    Lil(LilEngine),
}

impl Engine {
    /// Fresh engine state for the configured method.
    ///
    /// `null_rates` holds `beta·mu` per group.
    pub fn new(config: &AuditConfig, null_rates: Vec<f64>) -> Self {
        match config.method {
            Method::Eval => Engine::Capital(CapitalEngine::new(config.lambda_rule, null_rates)),
            Method::Sprt => Engine::Sprt(SprtEngine::new(null_rates)),
            Method::Lil => Engine::Lil(LilEngine::new(null_rates, config.alpha, config.asymptotic)),
        }
    }

    /// Feed the 0/1 membership vector of report `t` (1-based).
    pub fn step(&mut self, t: u64, flags: &[f64]) {
        match self {
            Engine::Capital(e) => e.step(t, flags),
            Engine::Sprt(e) => e.step(t, flags),
            Engine::Lil(e) => e.step(t, flags),
        }
    }

    /// Current statistic per group: log-wealth, log-likelihood ratio or count.
    pub fn statistics(&self) -> &[f64] {
        match self {
            Engine::Capital(e) => e.omega(),
            Engine::Sprt(e) => e.omega(),
            Engine::Lil(e) => e.counts(),
        }
    }

    pub fn groups(&self) -> usize {
        self.statistics().len()
    }

    /// Multiplicity-corrected rejection threshold for group `id`.
    pub fn corrected_threshold(&self, id: usize, alpha: f64) -> f64 {
        match self {
            Engine::Capital(_) | Engine::Sprt(_) => bonferroni_log_threshold(self.groups(), alpha),
            Engine::Lil(e) => e.boundary()[id],
        }
    }

    /// Per-group threshold without multiplicity correction.
    ///
    /// Diagnostic only; it never decides a rejection.
    pub fn uncorrected_threshold(&self, alpha: f64) -> f64 {
        uncorrected_log_threshold(alpha)
    }

    pub fn method(&self) -> Method {
        match self {
            Engine::Capital(_) => Method::Eval,
            Engine::Sprt(_) => Method::Sprt,
            Engine::Lil(_) => Method::Lil,
        }
    }
}
