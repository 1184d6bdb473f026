//! Daily returns and summary return statistics.

use super::volatility::sample_std;
use serde::{Deserialize, Serialize};

/// Day-over-day percentage changes. One fewer value than closes; a change
/// from a zero close is skipped.
pub fn pct_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Total return from the first close to the last.
///
/// An empty slice, or a zero first close, has no return to speak of: 0.
pub fn cumulative_return(closes: &[f64]) -> f64 {
    match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => (last - first) / first,
        _ => 0.0,
    }
}

/// Return profile of a single series over the fetched window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnStats {
    /// Mean daily return.
    pub mean_daily: f64,
    /// Sample standard deviation of daily returns over the whole window.
    pub risk: f64,
    pub cumulative: f64,
    pub observations: usize,
}

impl ReturnStats {
    /// `None` when the closes yield no daily return to average.
    pub fn from_closes(closes: &[f64]) -> Option<Self> {
        let returns = pct_returns(closes);
        if returns.is_empty() {
            return None;
        }
        let mean_daily = returns.iter().sum::<f64>() / returns.len() as f64;
        Some(Self {
            mean_daily,
            risk: sample_std(&returns).unwrap_or(0.0),
            cumulative: cumulative_return(closes),
            observations: returns.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn pct_returns_basic() {
        let r = pct_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert_approx(r[0], 0.10, DEFAULT_EPSILON);
        assert_approx(r[1], -0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn cumulative() {
        assert_approx(cumulative_return(&[50.0, 60.0, 75.0]), 0.5, DEFAULT_EPSILON);
        assert_approx(cumulative_return(&[80.0, 60.0]), -0.25, DEFAULT_EPSILON);
    }

    #[test]
    fn cumulative_of_empty_is_zero() {
        assert_eq!(cumulative_return(&[]), 0.0);
        assert_eq!(cumulative_return(&[0.0, 1.0]), 0.0);
        assert_eq!(cumulative_return(&[42.0]), 0.0);
    }

    #[test]
    fn stats_need_two_closes() {
        assert!(ReturnStats::from_closes(&[10.0]).is_none());
        let s = ReturnStats::from_closes(&[10.0, 11.0]).unwrap();
        assert_eq!(s.observations, 1);
        assert_eq!(s.risk, 0.0);
        assert_approx(s.cumulative, 0.1, DEFAULT_EPSILON);
    }
}
