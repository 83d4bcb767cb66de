//! Average True Range (ATR).
//!
//! True Range (from the second candle on):
//! max(high-low, |high-prev_close|, |low-prev_close|).
//! The TR series is smoothed with the mean-seeded EMA from [`super::ema`],
//! not Wilder's 1/period smoothing. Lookback: period. Output length: len - period.

use super::{ema_of_series, Indicator, Series};
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True Range series. `tr[k]` belongs to candle `k + 1`.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            let (prev, cur) = (&w[0], &w[1]);
            let tr1 = cur.high - cur.low;
            let tr2 = (cur.high - prev.close).abs();
            let tr3 = (cur.low - prev.close).abs();
            tr1.max(tr2).max(tr3)
        })
        .collect()
}

impl Indicator for Atr {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Series<f64> {
        if candles.len() < self.period + 1 {
            return Series::trailing(Vec::new(), candles.len());
        }
        Series::trailing(
            ema_of_series(&true_ranges(candles), self.period),
            candles.len(),
        )
    }
}
