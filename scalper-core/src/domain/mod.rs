//! Domain types for the scalper signal engine.

pub mod backtest;
pub mod candle;
pub mod signal;

pub use backtest::{BacktestResults, HistoricalSetup, SampledSetup, Setup};
pub use candle::{closes, highest_high, is_time_ordered, lowest_low, Candle};
pub use signal::{Direction, ExecutionParams, Gates, SignalState, TrendTag};
