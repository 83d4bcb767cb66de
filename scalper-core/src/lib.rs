//! Scalper Core — candles, indicators, gates, execution parameters, signal state.
//!
//! Pure computation for a four-gate scalping signal engine:
//! - Domain types (candles, gates, execution parameters, backtest results)
//! - Indicators carried as trimmed series with explicit offsets
//! - Gate validation and the NO_TRADE / SETUP / ENTRY state machine
//! - One explicit pipeline invocation per data arrival
//! - Owned application state with pure reducers and a log sink
//! - Candle sources (Bybit REST, local CSV/JSON)

pub mod data;
pub mod domain;
pub mod execution_params;
pub mod gates;
pub mod indicators;
pub mod log;
pub mod pipeline;
pub mod signal;
pub mod state;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the session hands across threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::Gates>();
        require_sync::<domain::Gates>();
        require_send::<domain::ExecutionParams>();
        require_sync::<domain::ExecutionParams>();
        require_send::<domain::BacktestResults>();
        require_sync::<domain::BacktestResults>();

        // Pipeline values
        require_send::<indicators::IndicatorSet>();
        require_sync::<indicators::IndicatorSet>();
        require_send::<pipeline::PipelineOutput>();
        require_sync::<pipeline::PipelineOutput>();

        // State and sources
        require_send::<state::AppState>();
        require_sync::<state::StateCell>();
        require_send::<data::BybitProvider>();
        require_sync::<data::BybitProvider>();
        require_sync::<data::CsvDirectorySource>();
    }
}
