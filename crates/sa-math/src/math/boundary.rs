//! Rejection thresholds for the sequential tests.
//!
//! Two families live here:
//! - log-scale thresholds for the wealth and likelihood-ratio statistics,
//!   `ln(G/alpha)` (Bonferroni over `G` groups) and `ln(1/alpha)` (per group);
//! - the law-of-iterated-logarithm boundary on raw cumulative match counts,
//!
//! ```text
//! b(t) = t·μ + f·√(2.07 · t · ln((2 + log₂ t)² / α))
//! ```
//!
//! where `f = √(min(μ,1)·max(1−μ,0))` for the asymptotic variant and `0.5`
//! otherwise. The asymptotic variant is not trusted before step 25 and
//! returns [`LIL_WARMUP_SENTINEL`] there.

/// Scale constant inside the iterated-logarithm radius.
pub const LIL_SCALE: f64 = 2.07;

/// Sub-Gaussian factor used by the non-asymptotic LIL boundary.
pub const LIL_DEFAULT_FACTOR: f64 = 0.5;

/// First step at which the asymptotic LIL boundary is used.
pub const LIL_WARMUP_STEPS: u64 = 25;

/// Boundary value during the asymptotic warm-up; never reachable by a count
/// observed in fewer than [`LIL_WARMUP_STEPS`] steps.
pub const LIL_WARMUP_SENTINEL: f64 = 20_000.0;

/// Multiplicity-corrected log threshold `ln(groups / alpha)`.
pub fn bonferroni_log_threshold(groups: usize, alpha: f64) -> f64 {
    (groups.max(1) as f64 / alpha).ln()
}

/// Per-group log threshold `ln(1 / alpha)`, with no multiplicity correction.
pub fn uncorrected_log_threshold(alpha: f64) -> f64 {
    (1.0 / alpha).ln()
}

/// Multiplier on the LIL radius for null rate `mu`.
pub fn lil_factor(mu: f64, asymptotic: bool) -> f64 {
    if asymptotic {
        (mu.min(1.0) * (1.0 - mu).max(0.0)).sqrt()
    } else {
        LIL_DEFAULT_FACTOR
    }
}

/// Iterated-logarithm radius `√(2.07 · t · ln((2 + log₂ t)² / α))`.
///
/// Returns 0 for `t == 0`.
pub fn lil_radius(t: u64, alpha: f64) -> f64 {
    if t == 0 {
        return 0.0;
    }
    let tf = t as f64;
    let iterated = (2.0 + tf.log2()).powi(2) / alpha;
    (LIL_SCALE * tf * iterated.ln()).sqrt()
}

/// LIL boundary on the cumulative match count of a group at step `t`.
pub fn lil_boundary(t: u64, mu: f64, alpha: f64, asymptotic: bool) -> f64 {
    if asymptotic && t < LIL_WARMUP_STEPS {
        return LIL_WARMUP_SENTINEL;
    }
    t as f64 * mu + lil_factor(mu, asymptotic) * lil_radius(t, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn bonferroni_three_groups() {
        let thresh = bonferroni_log_threshold(3, 0.05);
        assert!(approx_eq(thresh, 60.0f64.ln(), 1e-12));
        assert!(approx_eq(thresh, 4.094, 1e-3));
    }

    #[test]
    fn single_group_thresholds_coincide() {
        assert!(approx_eq(
            bonferroni_log_threshold(1, 0.1),
            uncorrected_log_threshold(0.1),
            1e-15
        ));
    }

    #[test]
    fn uncorrected_below_corrected() {
        for g in 2..50 {
            assert!(uncorrected_log_threshold(0.05) < bonferroni_log_threshold(g, 0.05));
        }
    }

    #[test]
    fn lil_factor_variants() {
        assert_eq!(lil_factor(0.3, false), 0.5);
        assert!(approx_eq(lil_factor(0.3, true), (0.3f64 * 0.7).sqrt(), 1e-12));
        // mu above one collapses the variance term
        assert_eq!(lil_factor(1.2, true), 0.0);
    }

    #[test]
    fn lil_radius_at_one() {
        // log2(1) = 0 so the iterated term is ln(4 / alpha)
        let expected = (LIL_SCALE * (4.0f64 / 0.05).ln()).sqrt();
        assert!(approx_eq(lil_radius(1, 0.05), expected, 1e-12));
        assert_eq!(lil_radius(0, 0.05), 0.0);
    }

    #[test]
    fn lil_boundary_known_value() {
        let t = 100u64;
        let mu = 0.15;
        let alpha = 0.05;
        let radius = (LIL_SCALE * 100.0 * ((2.0 + 100f64.log2()).powi(2) / alpha).ln()).sqrt();
        let expected = 100.0 * mu + 0.5 * radius;
        assert!(approx_eq(lil_boundary(t, mu, alpha, false), expected, 1e-9));
    }

    #[test]
    fn asymptotic_warmup_sentinel() {
        for t in 1..LIL_WARMUP_STEPS {
            assert_eq!(lil_boundary(t, 0.2, 0.05, true), LIL_WARMUP_SENTINEL);
        }
        assert!(lil_boundary(LIL_WARMUP_STEPS, 0.2, 0.05, true) < 100.0);
    }

    #[test]
    fn non_asymptotic_has_no_warmup() {
        assert!(lil_boundary(1, 0.2, 0.05, false) < 5.0);
    }
}
