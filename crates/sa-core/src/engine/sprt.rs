//! Sequential probability ratio test on per-group match counts.

use sa_math::{sprt_log_ratio, SPRT_EPSILON};

#[derive(Debug, Clone)]
pub struct SprtEngine {
    null_rates: Vec<f64>,
    counts: Vec<f64>,
    omega: Vec<f64>,
}

impl SprtEngine {
    pub fn new(null_rates: Vec<f64>) -> Self {
        let groups = null_rates.len();
        SprtEngine {
            null_rates,
            counts: vec![0.0; groups],
            omega: vec![0.0; groups],
        }
    }

    /// Recompute the closed-form log-ratio after step `t`.
    pub fn step(&mut self, t: u64, flags: &[f64]) {
        let n = t as f64;
        for i in 0..self.omega.len() {
            self.counts[i] += flags[i];
            self.omega[i] = sprt_log_ratio(self.counts[i], n, self.null_rates[i], SPRT_EPSILON);
        }
    }

    pub fn omega(&self) -> &[f64] {
        &self.omega
    }

    /// Matches observed so far per group.
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }
}
