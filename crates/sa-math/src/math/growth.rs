//! Expected log-wealth growth of a constant bet.
//!
//! For a group whose true report rate is `mu_g`, tested against the scaled
//! null `beta·mu_0`, a closed-form constant betting fraction and the expected
//! per-step log-wealth it earns. The fraction normalises by `1 - mu_0`
//! rather than `1 - beta·mu_0`, so it is the log-optimal bet only at
//! `beta == 1`; for other `beta` the growth is a lower bound on what the
//! best constant bet achieves. Dividing `ln(G/alpha)` by the growth rate
//! gives a rough detection delay.

use serde::Serialize;

/// Closed-form constant bet and the growth rate it achieves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthRate {
    /// Normalised betting fraction in `[0, 1]`.
    pub lambda_opt: f64,
    /// Expected log-wealth gained per report.
    pub growth: f64,
}

impl GrowthRate {
    /// Steps needed to reach `log_threshold`, or `None` if wealth does not grow.
    pub fn detection_delay(&self, log_threshold: f64) -> Option<f64> {
        if self.growth > 0.0 && self.growth.is_finite() {
            Some(log_threshold / self.growth)
        } else {
            None
        }
    }
}

/// Expected log-wealth of the closed-form constant bet.
///
/// With `beta == 1` the bet is log-optimal and the interior case reduces to
/// `KL(mu_g || mu_0)`.
pub fn expected_log_wealth(mu_g: f64, beta: f64, mu_0: f64) -> GrowthRate {
    let scaled = beta * mu_0;
    let raw = (mu_g - scaled) / (scaled * (1.0 - mu_0));
    let lambda_opt = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };

    let growth = if lambda_opt >= 1.0 {
        mu_g * (1.0 + 1.0 / (1.0 - scaled)).ln() + (1.0 - scaled).ln()
    } else if lambda_opt <= 0.0 {
        0.0
    } else {
        mu_g * ((1.0 / scaled - 1.0) * mu_g - (1.0 - beta) * mu_0).ln()
            + (1.0 - mu_g) * ((1.0 - mu_g) - (1.0 - beta) * mu_0).ln()
            - (1.0 - mu_0).ln()
    };

    GrowthRate { lambda_opt, growth }
}
