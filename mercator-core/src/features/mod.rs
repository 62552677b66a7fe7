//! Volatility feature computation.
//!
//! `volatility` holds the per-series kernels; `engine` applies them per
//! instrument over a long-format OHLCV frame, appending the `ret_log_1d`,
//! `vol_pk` and `vol_gk` columns.

pub mod engine;
pub mod volatility;

pub use engine::{add_range_vol_features, FeatureError};
pub use volatility::{garman_klass_vol, log_returns, parkinson_vol, DEFAULT_WINDOW};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for kernel tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
