//! Candle source trait and structured error types.
//!
//! The `CandleSource` trait abstracts over where candles come from (Bybit,
//! local CSV files) so the session can swap implementations and mock for tests.

use thiserror::Error;

use crate::domain::Candle;
use crate::indicators::MIN_CANDLES;

/// Fewer valid candles than this from a source is an error.
pub const MIN_FETCH_CANDLES: usize = MIN_CANDLES;

/// Structured error types for candle fetches.
///
/// Displayed verbatim in the application log after an `API Error:` prefix.
#[derive(Debug, Error)]
pub enum DataError {
    /// The upstream service answered with an error of its own.
    #[error("{0}")]
    Upstream(String),

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("response format changed: {0}")]
    InvalidResponse(String),

    #[error("Insufficient data: only {count} valid candles")]
    InsufficientCandles { count: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait for candle sources.
pub trait CandleSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch up to `limit` candles, ascending by time.
    fn fetch(&self, symbol: &str, timeframe: &str, limit: usize)
        -> Result<Vec<Candle>, DataError>;
}

/// Drop void candles, sort ascending by time and enforce the candle floor.
pub(crate) fn finish_candles(candles: Vec<Candle>) -> Result<Vec<Candle>, DataError> {
    let candles = without_void(candles);
    if candles.len() < MIN_FETCH_CANDLES {
        return Err(DataError::InsufficientCandles {
            count: candles.len(),
        });
    }
    Ok(candles)
}

/// Candles with no NaN field, ascending by time.
pub(crate) fn without_void(mut candles: Vec<Candle>) -> Vec<Candle> {
    candles.retain(|c| !c.is_void());
    candles.sort_by_key(|c| c.time);
    candles
}
