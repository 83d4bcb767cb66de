//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = price[t] * k + EMA[t-1] * (1 - k), k = 2 / (period + 1).
//! Seed: the first value is the arithmetic mean of the first `period` prices.
//! Lookback: period - 1. Output length: len - period + 1.

use super::{Indicator, Series};
use crate::domain::{closes, Candle};

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Series<f64> {
        Series::trailing(ema_of_series(&closes(candles), self.period), candles.len())
    }
}

/// EMA of an arbitrary series, trimmed to warmed-up values.
///
/// Returns an empty vector when `values` is shorter than `period`.
/// ATR smooths its true-range series through this same routine.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len() - period + 1);

    let mut sum = 0.0;
    for &v in &values[..period] {
        sum += v;
    }
    let mut prev = sum / period as f64;
    result.push(prev);

    for &v in &values[period..] {
        prev = v * multiplier + prev * (1.0 - multiplier);
        result.push(prev);
    }

    result
}
