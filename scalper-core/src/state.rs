//! Application state, its holder, and pure reducers.
//!
//! The state is an owned value. Every change goes through a reducer
//! `AppState -> AppState` applied by a [`StateHolder`], one writer at a time.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::domain::{BacktestResults, Candle, ExecutionParams, Gates, Setup, SignalState};
use crate::indicators::IndicatorSet;
use crate::log::{trace_entry, LogEntry, LogLevel, LogSink};
use crate::signal::SignalDecision;

/// Entries kept in `AppState::logs`; older ones are dropped.
pub const LOG_CAPACITY: usize = 50;

pub const DEFAULT_SYMBOL: &str = "SOLUSDT";
pub const DEFAULT_TIMEFRAME: &str = "5m";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub current_symbol: String,
    pub current_timeframe: String,
    pub auto_calculation: bool,
    pub candles: Vec<Candle>,
    pub indicators: IndicatorSet,
    pub gates: Gates,
    pub signal_engine: SignalState,
    pub execution_params: ExecutionParams,
    pub logs: Vec<LogEntry>,
    pub backtest_results: BacktestResults,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            current_symbol: DEFAULT_SYMBOL.to_string(),
            current_timeframe: DEFAULT_TIMEFRAME.to_string(),
            auto_calculation: true,
            candles: Vec::new(),
            indicators: IndicatorSet::default(),
            gates: Gates::default(),
            signal_engine: SignalState::NoTrade,
            execution_params: ExecutionParams::default(),
            logs: Vec::new(),
            backtest_results: BacktestResults::default(),
        }
    }
}

impl AppState {
    pub fn last_log(&self) -> Option<&LogEntry> {
        self.logs.last()
    }
}

/// Owner of the authoritative state between pipeline runs.
pub trait StateHolder: Send + Sync {
    /// Snapshot of the current state.
    fn current(&self) -> AppState;

    /// Apply `reducer` atomically.
    fn update<F>(&self, reducer: F)
    where
        F: FnOnce(AppState) -> AppState;
}

/// In-memory state holder guarded by a mutex.
///
/// Also acts as the log sink: entries land in `AppState::logs` and are
/// mirrored to `tracing`.
#[derive(Debug, Default)]
pub struct StateCell {
    inner: Mutex<AppState>,
}

impl StateCell {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    pub fn into_inner(self) -> AppState {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateHolder for StateCell {
    fn current(&self) -> AppState {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update<F>(&self, reducer: F)
    where
        F: FnOnce(AppState) -> AppState,
    {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let current = std::mem::take(&mut *guard);
        *guard = reducer(current);
    }
}

impl LogSink for StateCell {
    fn log(&self, level: LogLevel, message: &str) {
        trace_entry(level, message);
        let entry = LogEntry::now(level, message);
        self.update(|s| push_log(s, entry));
    }
}

// Reducers

pub fn with_symbol(state: AppState, symbol: impl Into<String>) -> AppState {
    AppState {
        current_symbol: symbol.into(),
        ..state
    }
}

pub fn with_timeframe(state: AppState, timeframe: impl Into<String>) -> AppState {
    AppState {
        current_timeframe: timeframe.into(),
        ..state
    }
}

pub fn with_auto_calculation(state: AppState, enabled: bool) -> AppState {
    AppState {
        auto_calculation: enabled,
        ..state
    }
}

pub fn with_candles(state: AppState, candles: Vec<Candle>) -> AppState {
    AppState { candles, ..state }
}

pub fn with_indicators(state: AppState, indicators: IndicatorSet) -> AppState {
    AppState { indicators, ..state }
}

pub fn with_gates(state: AppState, gates: Gates) -> AppState {
    AppState { gates, ..state }
}

/// Signal state and execution parameters in one step.
///
/// A decision without parameters leaves the previous ones in place.
pub fn with_decision(state: AppState, decision: SignalDecision) -> AppState {
    let execution_params = decision.execution.unwrap_or(state.execution_params.clone());
    AppState {
        signal_engine: decision.state,
        execution_params,
        ..state
    }
}

/// Empty indicators, closed gates, `NO_TRADE`. Execution parameters are kept.
pub fn with_inert_pipeline(state: AppState) -> AppState {
    AppState {
        indicators: IndicatorSet::default(),
        gates: Gates::default(),
        signal_engine: SignalState::NoTrade,
        ..state
    }
}

pub fn with_backtest_results(state: AppState, results: BacktestResults) -> AppState {
    AppState {
        backtest_results: results,
        ..state
    }
}

/// Replace the results with `setups` and zeroed statistics.
pub fn with_setups(state: AppState, setups: Vec<Setup>) -> AppState {
    with_backtest_results(state, BacktestResults::from_setups(setups))
}

pub fn cleared_backtest(state: AppState) -> AppState {
    with_backtest_results(state, BacktestResults::default())
}

pub fn push_log(mut state: AppState, entry: LogEntry) -> AppState {
    state.logs.push(entry);
    if state.logs.len() > LOG_CAPACITY {
        let excess = state.logs.len() - LOG_CAPACITY;
        state.logs.drain(..excess);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SampledSetup;

    #[test]
    fn default_matches_initial_state() {
        let s = AppState::default();
        assert_eq!(s.current_symbol, "SOLUSDT");
        assert_eq!(s.current_timeframe, "5m");
        assert!(s.auto_calculation);
        assert_eq!(s.signal_engine, SignalState::NoTrade);
        assert_eq!(s.execution_params.risk_reward, "1:2");
        assert!(s.backtest_results.is_empty());
    }

    #[test]
    fn log_ring_keeps_last_fifty() {
        let cell = StateCell::default();
        for i in 0..60 {
            cell.info(&format!("entry {i}"));
        }
        let s = cell.current();
        assert_eq!(s.logs.len(), LOG_CAPACITY);
        assert_eq!(s.logs[0].message, "entry 10");
        assert_eq!(s.last_log().map(|e| e.message.as_str()), Some("entry 59"));
    }

    #[test]
    fn decision_without_params_keeps_previous() {
        let mut state = AppState::default();
        state.execution_params.entry = 42.0;
        let state = with_decision(
            state,
            SignalDecision {
                state: SignalState::Setup,
                execution: None,
            },
        );
        assert_eq!(state.signal_engine, SignalState::Setup);
        assert_eq!(state.execution_params.entry, 42.0);
    }

    #[test]
    fn inert_keeps_execution_params() {
        let mut state = AppState::default();
        state.execution_params.entry = 7.0;
        state.gates.trend_stack = true;
        state.signal_engine = SignalState::Entry;
        let state = with_inert_pipeline(state);
        assert_eq!(state.gates, Gates::default());
        assert_eq!(state.signal_engine, SignalState::NoTrade);
        assert_eq!(state.execution_params.entry, 7.0);
    }

    #[test]
    fn setups_replace_results_wholesale() {
        let mut state = AppState::default();
        state.backtest_results.hit_rate = 55.0;
        let setup = Setup::Sampled(SampledSetup {
            entry: 1.0,
            stop: 0.5,
            tp: 2.0,
            r: 2.0,
        });
        let state = with_setups(state, vec![setup]);
        assert_eq!(state.backtest_results.setups.len(), 1);
        assert_eq!(state.backtest_results.hit_rate, 0.0);
        assert!(cleared_backtest(state).backtest_results.is_empty());
    }

    #[test]
    fn candle_field_has_one_name() {
        let json = serde_json::to_value(AppState::default()).unwrap();
        let mut obj = json.as_object().unwrap().clone();
        assert!(obj.contains_key("candles"));

        let candles = obj.remove("candles").unwrap();
        obj.insert("ohlcvData".into(), candles);
        assert!(serde_json::from_value::<AppState>(obj.into()).is_err());
    }
}
