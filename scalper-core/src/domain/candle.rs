//! Candle — the fundamental market data unit.

use serde::{Deserialize, Serialize};

/// OHLCV candle for one instrument on one timeframe.
///
/// `time` is the candle open time in epoch milliseconds. Sequences are expected
/// in ascending time order; ordering is the candle source's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Absolute distance between open and close.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Distance from the top of the body to the high.
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Distance from the low to the bottom of the body.
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }
}

/// Close prices of a candle slice, in order.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Highest high over a window. `-inf` for an empty window.
pub fn highest_high(window: &[Candle]) -> f64 {
    window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max)
}

/// Lowest low over a window. `+inf` for an empty window.
pub fn lowest_low(window: &[Candle]) -> f64 {
    window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min)
}

/// True when timestamps strictly increase.
pub fn is_time_ordered(candles: &[Candle]) -> bool {
    candles.windows(2).all(|w| w[0].time < w[1].time)
}
