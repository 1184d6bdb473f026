//! Realized volatility: sample standard deviation of daily percentage returns.

use super::returns::pct_returns;

/// Sample standard deviation (n - 1 denominator). `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(var.sqrt())
}

/// Volatility of the most recent `window` daily returns.
///
/// Shorter histories use every return available. Fewer than two returns
/// means there is nothing to measure and the result is 0.
pub fn realized_volatility(closes: &[f64], window: usize) -> f64 {
    let returns = pct_returns(closes);
    let take = window.min(returns.len());
    sample_std(&returns[returns.len() - take..]).unwrap_or(0.0)
}
