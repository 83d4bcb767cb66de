//! Relative Strength Index (RSI).
//!
//! Gains/losses from consecutive close deltas. Seed averages are plain means of
//! the first `period` gains and losses; later values use Wilder smoothing
//! avg = (avg * (period - 1) + new) / period.
//! RSI = 100 - 100 / (1 + rs), rs = +inf when the average loss is zero.
//! Lookback: period. Output length: len - period.

use super::{Indicator, Series};
use crate::domain::{closes, Candle};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Series<f64> {
        Series::trailing(rsi_of_series(&closes(candles), self.period), candles.len())
    }
}

/// RSI of a price series, trimmed to warmed-up values.
pub fn rsi_of_series(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period + 1 {
        return Vec::new();
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (
                if change > 0.0 { change } else { 0.0 },
                if change < 0.0 { change.abs() } else { 0.0 },
            )
        })
        .unzip();

    let p = period as f64;
    let mut avg_gain = gains[..period].iter().fold(0.0, |sum, g| sum + g) / p;
    let mut avg_loss = losses[..period].iter().fold(0.0, |sum, l| sum + l) / p;

    let mut result = Vec::with_capacity(gains.len() - period + 1);
    result.push(compute_rsi(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (p - 1.0) + gains[i]) / p;
        avg_loss = (avg_loss * (p - 1.0) + losses[i]) / p;
        result.push(compute_rsi(avg_gain, avg_loss));
    }

    result
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss == 0.0 {
        f64::INFINITY
    } else {
        avg_gain / avg_loss
    };
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles};

    #[test]
    fn rsi_all_gains() {
        let result = rsi_of_series(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0], 3);
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|&v| v == 100.0));
    }

    #[test]
    fn rsi_all_losses() {
        let result = rsi_of_series(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0], 3);
        assert_approx(result[0], 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_prices_read_100() {
        // No losses at all: rs = +inf → RSI = 100
        let result = rsi_of_series(&[50.0; 20], 14);
        assert_eq!(result.len(), 6);
        assert!(result.iter().all(|&v| v == 100.0));
    }

    #[test]
    fn rsi_mixed_seed() {
        // Changes: +0.34, -0.25, -0.48
        // avg_gain = 0.34/3, avg_loss = 0.73/3 → RSI = 100 - 100/(1 + 0.34/0.73)
        let result = rsi_of_series(&[44.0, 44.34, 44.09, 43.61], 3);
        let expected = 100.0 - 100.0 / (1.0 + (0.34 / 3.0) / (0.73 / 3.0));
        assert_approx(result[0], expected, 1e-9);
    }

    #[test]
    fn rsi_wilder_step() {
        // period 2, changes: +2, -1, +3
        // seed: gain 1.0, loss 0.5 → RSI 66.67
        // next: gain (1*1+3)/2 = 2.0, loss (0.5*1+0)/2 = 0.25 → rs 8 → 88.89
        let result = rsi_of_series(&[10.0, 12.0, 11.0, 14.0], 2);
        assert_eq!(result.len(), 2);
        assert_approx(result[0], 100.0 - 100.0 / 3.0, 1e-9);
        assert_approx(result[1], 100.0 - 100.0 / 9.0, 1e-9);
    }

    #[test]
    fn rsi_too_short_is_empty() {
        assert!(rsi_of_series(&[1.0, 2.0, 3.0], 3).is_empty());
    }

    #[test]
    fn rsi_indicator_alignment() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 4) as f64).collect();
        let series = Rsi::new(14).compute(&make_candles(&closes));
        assert_eq!(series.offset(), 14);
        assert_eq!(series.len(), 16);
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
