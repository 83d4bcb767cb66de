//! Simple moving averages over raw value slices.
//!
//! The forward-walk backtest uses these as its trend proxy instead of the EMA
//! indicator.

/// Arithmetic mean, summed left to right. NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |sum, v| sum + v) / values.len() as f64
}

/// Mean of the last `window` values. `None` if fewer values are available.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    Some(mean(&values[values.len() - window..]))
}
