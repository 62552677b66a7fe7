//! Range-based volatility estimators.
//!
//! Parkinson uses the daily high/low range:
//!   term[t] = (1 / (4 ln 2)) * ln(high/low)^2
//! Garman-Klass adds the open/close body:
//!   term[t] = 0.5 * ln(high/low)^2 - (2 ln 2 - 1) * ln(close/open)^2
//! Each estimator is the square root of a trailing rolling sum of terms,
//! NaN until the first full window. NaN marks undefined throughout: bad
//! prices flow through `f64::ln` as NaN or infinity, never as errors.

use std::f64::consts::LN_2;

/// Default trailing window for the range-volatility estimators.
pub const DEFAULT_WINDOW: usize = 20;

/// One-day log returns: out[t] = ln(close[t]) - ln(close[t-1]).
///
/// out[0] is NaN (no previous close). Length matches the input.
pub fn log_returns(close: &[f64]) -> Vec<f64> {
    let n = close.len();
    let mut out = vec![f64::NAN; n];
    for i in 1..n {
        out[i] = close[i].ln() - close[i - 1].ln();
    }
    out
}

/// Parkinson range volatility over a trailing `window`.
///
/// Square root of the rolling sum of per-day terms, not a rolling stddev.
/// NaN before the first full window and for `window == 0`; a window
/// containing an undefined term is also NaN.
pub fn parkinson_vol(high: &[f64], low: &[f64], window: usize) -> Vec<f64> {
    assert_eq!(high.len(), low.len(), "high/low length mismatch");

    let coef = 1.0 / (4.0 * LN_2);
    let terms: Vec<f64> = high
        .iter()
        .zip(low)
        .map(|(&h, &l)| {
            let r = (h / l).ln();
            coef * r * r
        })
        .collect();

    rolling_sum(&terms, window).into_iter().map(f64::sqrt).collect()
}

/// Garman-Klass range volatility over a trailing `window`.
///
/// The body term can push a window sum below zero on pathological bars;
/// the sum is clamped at zero before the square root. NaN sums stay NaN.
pub fn garman_klass_vol(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    window: usize,
) -> Vec<f64> {
    let n = open.len();
    assert_eq!(high.len(), n, "open/high length mismatch");
    assert_eq!(low.len(), n, "open/low length mismatch");
    assert_eq!(close.len(), n, "open/close length mismatch");

    let k = 2.0 * LN_2 - 1.0;
    let terms: Vec<f64> = (0..n)
        .map(|i| {
            let range = (high[i] / low[i]).ln();
            let body = (close[i] / open[i]).ln();
            0.5 * range * range - k * body * body
        })
        .collect();

    rolling_sum(&terms, window)
        .into_iter()
        // f64::max would swallow the NaN, so keep undefined windows undefined
        // before clamping.
        .map(|s| if s.is_nan() { f64::NAN } else { s.max(0.0).sqrt() })
        .collect()
}

/// Trailing rolling sum: out[t] = sum(terms[t+1-window ..= t]) once a full
/// window exists, NaN before that. Each window is summed directly; a sliding
/// accumulator would never recover after a NaN term.
fn rolling_sum(terms: &[f64], window: usize) -> Vec<f64> {
    let n = terms.len();
    let mut out = vec![f64::NAN; n];

    if window == 0 || n < window {
        return out;
    }

    for i in (window - 1)..n {
        let start = i + 1 - window;
        out[i] = terms[start..=i].iter().sum();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn log_returns_basic() {
        let out = log_returns(&[100.0, 110.0, 121.0]);
        assert!(out[0].is_nan());
        // 110/100 and 121/110 are both a 10% move
        assert_approx(out[1], 1.1f64.ln(), DEFAULT_EPSILON);
        assert_approx(out[2], 1.1f64.ln(), DEFAULT_EPSILON);
    }

    #[test]
    fn log_returns_short_inputs() {
        assert!(log_returns(&[]).is_empty());
        let single = log_returns(&[42.0]);
        assert_eq!(single.len(), 1);
        assert!(single[0].is_nan());
    }

    #[test]
    fn log_returns_bad_prices_propagate() {
        let out = log_returns(&[100.0, 0.0, 50.0, -5.0, 10.0]);
        // ln(0) = -inf, so the step into zero is -inf and the step out is +inf
        assert!(out[1].is_infinite() && out[1] < 0.0);
        assert!(out[2].is_infinite() && out[2] > 0.0);
        // ln of a negative price is NaN on both sides of the diff
        assert!(out[3].is_nan());
        assert!(out[4].is_nan());
    }

    #[test]
    fn parkinson_flat_range_is_zero() {
        let high = [100.0; 5];
        let low = [100.0; 5];
        let out = parkinson_vol(&high, &low, 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_approx(out[2], 0.0, DEFAULT_EPSILON);
        assert_approx(out[4], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn parkinson_single_window_known_value() {
        // high/low = 2: term = (1/(4 ln 2)) * ln(2)^2 = ln(2)/4,
        // so vol = sqrt(ln 2)/2.
        let out = parkinson_vol(&[200.0], &[100.0], 1);
        assert_approx(out[0], LN_2.sqrt() / 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn parkinson_rolls_the_trailing_window() {
        let high = [110.0, 104.0, 108.0, 112.0];
        let low = [100.0; 4];
        let term = |h: f64| (h / 100.0).ln().powi(2) / (4.0 * LN_2);
        let out = parkinson_vol(&high, &low, 2);
        assert!(out[0].is_nan());
        assert_approx(out[1], (term(110.0) + term(104.0)).sqrt(), DEFAULT_EPSILON);
        assert_approx(out[2], (term(104.0) + term(108.0)).sqrt(), DEFAULT_EPSILON);
        assert_approx(out[3], (term(108.0) + term(112.0)).sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn parkinson_window_longer_than_series() {
        let out = parkinson_vol(&[101.0, 102.0], &[100.0, 100.0], 5);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn parkinson_zero_window_is_undefined() {
        let out = parkinson_vol(&[101.0, 102.0], &[100.0, 100.0], 0);
        assert!(out.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn garman_klass_flat_bars_are_zero() {
        let p = [100.0; 6];
        let out = garman_klass_vol(&p, &p, &p, &p, 4);
        assert!(out[2].is_nan());
        assert_approx(out[3], 0.0, DEFAULT_EPSILON);
        assert_approx(out[5], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn garman_klass_single_window_known_value() {
        // high/low = 2 with close == open: term = 0.5 * ln(2)^2,
        // so vol = ln(2) * sqrt(0.5).
        let out = garman_klass_vol(&[100.0], &[200.0], &[100.0], &[100.0], 1);
        assert_approx(out[0], LN_2 * 0.5f64.sqrt(), DEFAULT_EPSILON);
    }

    #[test]
    fn garman_klass_negative_sum_clamps_to_zero() {
        // Zero range with a large close/open body makes every term negative.
        let open = [100.0; 3];
        let high = [100.0; 3];
        let low = [100.0; 3];
        let close = [120.0; 3];
        let out = garman_klass_vol(&open, &high, &low, &close, 2);
        assert!(out[0].is_nan());
        assert_approx(out[1], 0.0, DEFAULT_EPSILON);
        assert_approx(out[2], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn garman_klass_nan_windows_stay_nan() {
        let mut open = [100.0; 5];
        open[1] = f64::NAN;
        let high = [110.0; 5];
        let low = [100.0; 5];
        let close = [105.0; 5];
        let out = garman_klass_vol(&open, &high, &low, &close, 2);
        // Windows touching the NaN bar are undefined, not clamped to zero.
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
        assert!(out[3].is_finite());
        assert!(out[4].is_finite());
    }

    #[test]
    fn estimators_preserve_length() {
        let high = [101.0, 103.0, 102.0];
        let low = [99.0, 100.0, 98.0];
        assert_eq!(parkinson_vol(&high, &low, 2).len(), 3);
        assert_eq!(log_returns(&low).len(), 3);
        assert_eq!(garman_klass_vol(&low, &high, &low, &high, 2).len(), 3);
    }
}
