//! Log-likelihood ratio for the Bernoulli SPRT.
//!
//! Alternative `rate = (1+ε)·μ` against null `rate = μ`, accumulated over `t`
//! observations of which `count` matched:
//!
//! ```text
//! Λ = count·ln(1+ε) + (t − count)·(ln(max(0.01, 1 − (1+ε)μ)) − ln(1 − μ))
//! ```
//!
//! The `0.01` floor keeps the alternative's miss probability positive when
//! `(1+ε)·μ ≥ 1`.

/// Relative effect size of the SPRT alternative.
pub const SPRT_EPSILON: f64 = 0.05;

/// Floor on the alternative's miss probability.
pub const SPRT_LOG_FLOOR: f64 = 0.01;

/// Log-ratio contributed by one matching observation.
pub fn sprt_match_weight(eps: f64) -> f64 {
    eps.ln_1p()
}

/// Log-ratio contributed by one non-matching observation.
pub fn sprt_miss_weight(mu: f64, eps: f64) -> f64 {
    let alt_miss = (1.0 - (1.0 + eps) * mu).max(SPRT_LOG_FLOOR);
    alt_miss.ln() - (1.0 - mu).ln()
}

/// Closed-form SPRT statistic after `t` observations with `count` matches.
pub fn sprt_log_ratio(count: f64, t: f64, mu: f64, eps: f64) -> f64 {
    count * sprt_match_weight(eps) + (t - count) * sprt_miss_weight(mu, eps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn all_matches() {
        let out = sprt_log_ratio(10.0, 10.0, 0.2, SPRT_EPSILON);
        assert!(approx_eq(out, 10.0 * 1.05f64.ln(), 1e-12));
    }

    #[test]
    fn no_matches_is_negative() {
        let out = sprt_log_ratio(0.0, 10.0, 0.2, SPRT_EPSILON);
        let expected = 10.0 * ((1.0 - 1.05 * 0.2f64).ln() - 0.8f64.ln());
        assert!(approx_eq(out, expected, 1e-12));
        assert!(out < 0.0);
    }

    #[test]
    fn floor_applies_for_large_mu() {
        // (1 + 0.05) * 0.98 > 1 so the floor kicks in
        let w = sprt_miss_weight(0.98, SPRT_EPSILON);
        assert!(approx_eq(w, SPRT_LOG_FLOOR.ln() - 0.02f64.ln(), 1e-12));
        assert!(w.is_finite());
    }

    #[test]
    fn empty_stream_is_zero() {
        assert_eq!(sprt_log_ratio(0.0, 0.0, 0.3, SPRT_EPSILON), 0.0);
    }
}
