//! Betting capital process (e-process) per group.
//!
//! Each report pays `1 + g·lambda` on the current stake, with
//! `g = x - beta·mu`. Under the null `E[g] <= 0`, so the running log-wealth
//! is a nonnegative supermartingale in wealth terms and crossing
//! `ln(G/alpha)` controls the family-wise error at any stopping time.

use crate::lambda::LambdaEstimator;
use sa_config::LambdaRule;
use sa_math::log_wealth_increment;

#[derive(Debug, Clone)]
pub struct CapitalEngine {
    null_rates: Vec<f64>,
    omega: Vec<f64>,
    lambda: Vec<f64>,
    estimator: LambdaEstimator,
    g: Vec<f64>,
    dot: Vec<f64>,
}

impl CapitalEngine {
    pub fn new(rule: LambdaRule, null_rates: Vec<f64>) -> Self {
        let groups = null_rates.len();
        CapitalEngine {
            estimator: LambdaEstimator::new(rule, &null_rates),
            null_rates,
            omega: vec![0.0; groups],
            lambda: vec![0.0; groups],
            g: vec![0.0; groups],
            dot: vec![0.0; groups],
        }
    }

    /// Bet the current fractions on `flags`, then let the estimator move them.
    pub fn step(&mut self, t: u64, flags: &[f64]) {
        for i in 0..self.omega.len() {
            let g = flags[i] - self.null_rates[i];
            self.g[i] = g;
            self.dot[i] = g * self.lambda[i];
            self.omega[i] += log_wealth_increment(g, self.lambda[i]);
        }
        self.estimator
            .update(t, &self.g, &self.dot, &mut self.lambda);
    }

    /// Log-wealth per group.
    pub fn omega(&self) -> &[f64] {
        &self.omega
    }

    /// Betting fractions to be used on the next report.
    pub fn lambdas(&self) -> &[f64] {
        &self.lambda
    }

    pub fn lambda_rule(&self) -> LambdaRule {
        self.estimator.rule()
    }
}
