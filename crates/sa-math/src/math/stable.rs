//! Numerically stable primitives for log-domain wealth math.

/// Online Newton Step step-size constant `2 / (2 - ln 3)`.
pub const ONS_STEP: f64 = 2.0 / (2.0 - 1.098_612_288_668_109_8);

/// Stable `ln(1 + g * lambda)` for a single betting round.
///
/// Uses `ln_1p` so small bets do not lose precision. Returns NEG_INFINITY when
/// the bet loses the whole stake (`g * lambda == -1`) and NaN when the product
/// falls below -1.
pub fn log_wealth_increment(g: f64, lambda: f64) -> f64 {
    let dot = g * lambda;
    if dot.is_nan() {
        return f64::NAN;
    }
    if dot == -1.0 {
        return f64::NEG_INFINITY;
    }
    dot.ln_1p()
}

/// Clamp `x` into `[lo, hi]`, mapping NaN to `lo`.
pub fn clip(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        return lo;
    }
    x.max(lo).min(hi)
}
