//! Close-price indicators.
//!
//! The classifier only needs the value at the latest close, so these work on
//! the tail of a close slice instead of producing a full series.

pub mod returns;
pub mod sma;
pub mod volatility;

pub use returns::{cumulative_return, pct_returns, ReturnStats};
pub use sma::trailing_sma;
pub use volatility::{realized_volatility, sample_std};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
