//! Cumulative match counts against the iterated-logarithm boundary.
//!
//! Unlike the log-scale statistics, the statistic here is a raw count and
//! the rejection boundary moves with `t` and with each group's null rate.

use sa_math::lil_boundary;

#[derive(Debug, Clone)]
pub struct LilEngine {
    null_rates: Vec<f64>,
    alpha: f64,
    asymptotic: bool,
    counts: Vec<f64>,
    boundary: Vec<f64>,
}

impl LilEngine {
    pub fn new(null_rates: Vec<f64>, alpha: f64, asymptotic: bool) -> Self {
        let groups = null_rates.len();
        LilEngine {
            null_rates,
            alpha,
            asymptotic,
            counts: vec![0.0; groups],
            boundary: vec![f64::INFINITY; groups],
        }
    }

    pub fn step(&mut self, t: u64, flags: &[f64]) {
        for i in 0..self.counts.len() {
            self.counts[i] += flags[i];
            self.boundary[i] = lil_boundary(t, self.null_rates[i], self.alpha, self.asymptotic);
        }
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Boundary for each group at the last step; infinite before the first.
    pub fn boundary(&self) -> &[f64] {
        &self.boundary
    }

    pub fn is_asymptotic(&self) -> bool {
        self.asymptotic
    }
}
