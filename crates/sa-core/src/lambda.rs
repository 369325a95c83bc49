//! Online estimators for the per-group betting fraction.
//!
//! After each report the capital process hands the estimator the centred
//! observation `g = x - beta·mu` and the product `dot = g·lambda` that was
//! just bet, and the estimator rewrites `lambda` in place.

use sa_config::LambdaRule;
use sa_math::{clip, ONS_STEP};

/// Added to the AGRAPA denominator to keep it positive.
pub const AGRAPA_EPSILON: f64 = 1e-8;

/// Online Newton Step.
#[derive(Debug, Clone)]
pub struct Ons {
    /// Running sum of squared gradients per group.
    sum_sq: Vec<f64>,
}

impl Ons {
    pub fn new(groups: usize) -> Self {
        Ons {
            sum_sq: vec![0.0; groups],
        }
    }

    fn update(&mut self, g: &[f64], dot: &[f64], lambda: &mut [f64]) {
        for (((lam, sum_sq), &g), &dot) in lambda
            .iter_mut()
            .zip(self.sum_sq.iter_mut())
            .zip(g)
            .zip(dot)
        {
            let grad = g / (1.0 + dot);
            *sum_sq += grad * grad;
            *lam = clip(*lam + ONS_STEP * grad / (1.0 + *sum_sq), 0.0, 1.0);
        }
    }
}

/// Approximate growth-rate adaptive estimator.
///
/// Tracks the sample mean and variance of the raw match indicator and bets
/// `diff / (var + diff²)` where `diff` is the excess of the mean over the
/// null rate.
#[derive(Debug, Clone)]
pub struct Agrapa {
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
    null_rates: Vec<f64>,
}

impl Agrapa {
    pub fn new(null_rates: Vec<f64>) -> Self {
        let groups = null_rates.len();
        Agrapa {
            sum: vec![0.0; groups],
            sum_sq: vec![0.0; groups],
            null_rates,
        }
    }

    fn update(&mut self, t: u64, g: &[f64], lambda: &mut [f64]) {
        let n = t as f64;
        for (i, lam) in lambda.iter_mut().enumerate() {
            let mu = self.null_rates[i];
            let x = g[i] + mu;
            self.sum[i] += x;
            self.sum_sq[i] += x * x;

            if t >= 2 {
                let mean = self.sum[i] / n;
                let var = ((self.sum_sq[i] - n * mean * mean) / (n - 1.0)).max(0.0);
                let diff = mean - mu;
                *lam = (diff / (var + diff * diff + AGRAPA_EPSILON)).max(0.0);
            }
            *lam = clip(*lam, 0.0, 1.0 / mu);
        }
    }
}

/// Betting-fraction estimator selected by [`LambdaRule`].
#[derive(Debug, Clone)]
pub enum LambdaEstimator {
    Ons(Ons),
    Agrapa(Agrapa),
}

impl LambdaEstimator {
    /// Fresh estimator state for groups with the given null rates `beta·mu`.
    pub fn new(rule: LambdaRule, null_rates: &[f64]) -> Self {
        match rule {
            LambdaRule::Ons => LambdaEstimator::Ons(Ons::new(null_rates.len())),
            LambdaRule::Agrapa => LambdaEstimator::Agrapa(Agrapa::new(null_rates.to_vec())),
        }
    }

    pub fn rule(&self) -> LambdaRule {
        match self {
            LambdaEstimator::Ons(_) => LambdaRule::Ons,
            LambdaEstimator::Agrapa(_) => LambdaRule::Agrapa,
        }
    }

    /// Update `lambda` after step `t` (1-based).
    pub fn update(&mut self, t: u64, g: &[f64], dot: &[f64], lambda: &mut [f64]) {
        match self {
            LambdaEstimator::Ons(ons) => ons.update(g, dot, lambda),
            LambdaEstimator::Agrapa(agrapa) => agrapa.update(t, g, lambda),
        }
    }

    /// Largest betting fraction the estimator can produce for group `id`.
    pub fn upper_bound(&self, id: usize) -> f64 {
        match self {
            LambdaEstimator::Ons(_) => 1.0,
            LambdaEstimator::Agrapa(agrapa) => 1.0 / agrapa.null_rates[id],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn step(est: &mut LambdaEstimator, t: u64, x: &[f64], mu: &[f64], lambda: &mut [f64]) {
        let g: Vec<f64> = x.iter().zip(mu).map(|(x, m)| x - m).collect();
        let dot: Vec<f64> = g.iter().zip(lambda.iter()).map(|(g, l)| g * l).collect();
        est.update(t, &g, &dot, lambda);
    }

    #[test]
    fn ons_first_step_from_zero() {
        let mu = [0.6];
        let mut est = LambdaEstimator::new(LambdaRule::Ons, &mu);
        let mut lambda = [0.0];
        step(&mut est, 1, &[1.0], &mu, &mut lambda);

        // grad = 0.4, sum_sq = 0.16
        let expected = ONS_STEP * 0.4 / 1.16;
        assert!(expected < 1.0);
        assert!((lambda[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn ons_large_first_step_clips_to_one() {
        let mu = [0.2];
        let mut est = LambdaEstimator::new(LambdaRule::Ons, &mu);
        let mut lambda = [0.0];
        step(&mut est, 1, &[1.0], &mu, &mut lambda);
        assert_eq!(lambda[0], 1.0);
    }

    #[test]
    fn ons_negative_gradient_clips_to_zero() {
        let mu = [0.2];
        let mut est = LambdaEstimator::new(LambdaRule::Ons, &mu);
        let mut lambda = [0.0];
        step(&mut est, 1, &[0.0], &mu, &mut lambda);
        assert_eq!(lambda[0], 0.0);
    }

    #[test]
    fn agrapa_waits_for_second_observation() {
        let mu = [0.2];
        let mut est = LambdaEstimator::new(LambdaRule::Agrapa, &mu);
        let mut lambda = [0.0];
        step(&mut est, 1, &[1.0], &mu, &mut lambda);
        assert_eq!(lambda[0], 0.0);
    }

    #[test]
    fn agrapa_known_value() {
        let mu = [0.2];
        let mut est = LambdaEstimator::new(LambdaRule::Agrapa, &mu);
        let mut lambda = [0.0];
        step(&mut est, 1, &[1.0], &mu, &mut lambda);
        step(&mut est, 2, &[0.0], &mu, &mut lambda);

        // mean 0.5, Bessel variance 0.5, diff 0.3
        let expected = 0.3 / (0.5 + 0.09 + AGRAPA_EPSILON);
        assert!((lambda[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn agrapa_clips_to_inverse_null_rate() {
        let mu = [0.5];
        let mut est = LambdaEstimator::new(LambdaRule::Agrapa, &mu);
        let mut lambda = [0.0];
        for t in 1..=10 {
            step(&mut est, t, &[1.0], &mu, &mut lambda);
        }
        // zero variance, diff 0.5 -> raw 2.0, bound 2.0
        assert!((lambda[0] - 2.0).abs() < 1e-6);
        assert_eq!(est.upper_bound(0), 2.0);
    }

    #[test]
    fn rule_roundtrip() {
        assert_eq!(LambdaEstimator::new(LambdaRule::Ons, &[0.1]).rule(), LambdaRule::Ons);
        assert_eq!(
            LambdaEstimator::new(LambdaRule::Agrapa, &[0.1]).rule(),
            LambdaRule::Agrapa
        );
    }

    proptest! {
        #[test]
        fn lambda_stays_within_bounds(
            flags in proptest::collection::vec(any::<bool>(), 1..200),
            base in 0.01f64..0.6,
            beta in 0.5f64..1.5,
            agrapa in any::<bool>(),
        ) {
            let mu = [beta * base];
            let rule = if agrapa { LambdaRule::Agrapa } else { LambdaRule::Ons };
            let mut est = LambdaEstimator::new(rule, &mu);
            let mut lambda = [0.0];
            for (i, hit) in flags.iter().enumerate() {
                let x = if *hit { 1.0 } else { 0.0 };
                step(&mut est, i as u64 + 1, &[x], &mu, &mut lambda);
                prop_assert!(lambda[0] >= 0.0);
                prop_assert!(lambda[0] <= est.upper_bound(0) + 1e-12);
            }
        }
    }
}
