//! Simple Moving Average (SMA) at the latest close.

/// Mean of the last `window` closes.
///
/// With fewer than `window` closes there is no average yet; the latest close
/// stands in for it, which makes price-versus-average comparisons neutral.
/// Returns `None` only for an empty slice.
pub fn trailing_sma(closes: &[f64], window: usize) -> Option<f64> {
    let last = *closes.last()?;
    if window == 0 || closes.len() < window {
        return Some(last);
    }
    let tail = &closes[closes.len() - window..];
    Some(tail.iter().sum::<f64>() / window as f64)
}
