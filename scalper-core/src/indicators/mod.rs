//! Technical indicators over candle sequences.
//!
//! Every indicator returns a trimmed [`Series`]: only warmed-up values are
//! stored, together with the candle index of the first value. Warm-up lengths
//! differ per indicator (EMA `period-1`, RSI `period`, ATR `period`, volume
//! `period-1`), so alignment always goes through [`Series::at`] or
//! [`Series::index_of`] instead of assuming parallel arrays.

pub mod atr;
pub mod ema;
pub mod rsi;
pub mod sma;
pub mod volume;

pub use atr::{true_ranges, Atr};
pub use ema::{ema_of_series, Ema};
pub use rsi::{rsi_of_series, Rsi};
pub use sma::{mean, trailing_mean};
pub use volume::{VolumeAnalysis, VolumeProfile};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Candle;

/// Minimum candle count for a full indicator run.
///
/// Applies regardless of which indicator needs less: the gate windows
/// downstream assume at least this much history.
pub const MIN_CANDLES: usize = 50;

pub const EMA_FAST: usize = 8;
pub const EMA_MID: usize = 21;
pub const EMA_SLOW: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const VOLUME_PERIOD: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("insufficient data for indicator calculation: need {required} candles, got {actual}")]
    InsufficientData { required: usize, actual: usize },
}

/// Trait for indicators.
///
/// Indicators are pure: candle history in, trimmed series out. No value may
/// depend on candles after the one it is aligned to.
pub trait Indicator: Send + Sync {
    type Output;

    /// Human-readable name (e.g., "ema_21", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading candles that produce no output.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the whole candle sequence.
    fn compute(&self, candles: &[Candle]) -> Series<Self::Output>;
}

/// Indicator values with their own alignment to the candle sequence.
///
/// `values[k]` belongs to candle `offset + k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series<T> {
    values: Vec<T>,
    offset: usize,
}

impl<T> Default for Series<T> {
    fn default() -> Self {
        Self {
            values: Vec::new(),
            offset: 0,
        }
    }
}

impl<T> Series<T> {
    pub fn new(values: Vec<T>, offset: usize) -> Self {
        Self { values, offset }
    }

    /// Series whose last value belongs to the last of `candle_count` candles.
    ///
    /// The offset is derived from the length difference, never hardcoded.
    pub fn trailing(values: Vec<T>, candle_count: usize) -> Self {
        let offset = candle_count.saturating_sub(values.len());
        Self { values, offset }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last(&self) -> Option<&T> {
        self.values.last()
    }

    /// Value by series index.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    /// Series index for a candle index, if that candle has a value.
    pub fn index_of(&self, candle_index: usize) -> Option<usize> {
        candle_index
            .checked_sub(self.offset)
            .filter(|&i| i < self.values.len())
    }

    /// Value aligned to a candle index.
    pub fn at(&self, candle_index: usize) -> Option<&T> {
        self.index_of(candle_index).map(|i| &self.values[i])
    }
}

impl Series<f64> {
    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// Full indicator set consumed by the gates, execution parameters and backtests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    pub ema8: Series<f64>,
    pub ema21: Series<f64>,
    pub ema50: Series<f64>,
    pub rsi14: Series<f64>,
    pub atr14: Series<f64>,
    pub volume: Series<VolumeAnalysis>,
}

impl IndicatorSet {
    /// True when no indicator has been computed (inert state).
    pub fn is_empty(&self) -> bool {
        self.ema8.is_empty()
            && self.ema21.is_empty()
            && self.ema50.is_empty()
            && self.rsi14.is_empty()
            && self.atr14.is_empty()
            && self.volume.is_empty()
    }
}

/// Compute every indicator the signal engine uses.
pub fn calculate_all_indicators(candles: &[Candle]) -> Result<IndicatorSet, IndicatorError> {
    if candles.len() < MIN_CANDLES {
        return Err(IndicatorError::InsufficientData {
            required: MIN_CANDLES,
            actual: candles.len(),
        });
    }

    Ok(IndicatorSet {
        ema8: compute_aligned(&Ema::new(EMA_FAST), candles),
        ema21: compute_aligned(&Ema::new(EMA_MID), candles),
        ema50: compute_aligned(&Ema::new(EMA_SLOW), candles),
        rsi14: compute_aligned(&Rsi::new(RSI_PERIOD), candles),
        atr14: compute_aligned(&Atr::new(ATR_PERIOD), candles),
        volume: compute_aligned(&VolumeProfile::new(VOLUME_PERIOD), candles),
    })
}

/// Compute `indicator`, checking that its series starts right after the lookback.
fn compute_aligned<I: Indicator>(indicator: &I, candles: &[Candle]) -> Series<I::Output> {
    let series = indicator.compute(candles);
    debug_assert!(
        series.is_empty() || series.offset() == indicator.lookback(),
        "{} misaligned: offset {} vs lookback {}",
        indicator.name(),
        series.offset(),
        indicator.lookback()
    );
    tracing::debug!(
        indicator = indicator.name(),
        lookback = indicator.lookback(),
        values = series.len(),
        "indicator computed"
    );
    series
}

/// Create synthetic candles from close prices for testing.
///
/// open = prev_close (or close for the first candle), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000, one minute apart.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                time: 1_700_000_000_000 + i as i64 * 60_000,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

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
