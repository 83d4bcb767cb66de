//! Session — binds a candle source, the state cell and the log.
//!
//! Each operation runs to completion before the next starts. The state cell is
//! the only mutator of record and doubles as the log sink, so every outcome
//! lands in `AppState::logs` as well as in `tracing`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use scalper_core::data::{CandleSource, DataError};
use scalper_core::domain::{BacktestResults, HistoricalSetup, Setup};
use scalper_core::execution_params::PositionSizing;
use scalper_core::log::LogSink;
use scalper_core::pipeline::{run_pipeline, PipelineOutput};
use scalper_core::signal::SignalDecision;
use scalper_core::state::{
    cleared_backtest, with_auto_calculation, with_backtest_results, with_candles, with_decision,
    with_gates, with_indicators, with_inert_pipeline, with_setups, with_symbol, with_timeframe,
    AppState, StateCell, StateHolder,
};
use tracing::info;

use crate::alert::{write_alert, TradingViewAlert};
use crate::backtest::BacktestError;
use crate::config::{RiskConfig, ScalperConfig};
use crate::forward_walk::run_forward_walk;
use crate::historical_scan::scan_historical_setups;
use crate::snapshot::Snapshot;

pub struct Session {
    source: Box<dyn CandleSource>,
    state: StateCell,
    limit: usize,
    risk: Option<RiskConfig>,
}

impl Session {
    pub fn new(source: Box<dyn CandleSource>, state: AppState, limit: usize) -> Self {
        Self {
            source,
            state: StateCell::new(state),
            limit,
            risk: None,
        }
    }

    /// Session seeded from configuration: instrument, fetch limit, sizing.
    pub fn from_config(source: Box<dyn CandleSource>, config: &ScalperConfig) -> Self {
        let state = AppState {
            current_symbol: config.market.symbol.clone(),
            current_timeframe: config.market.timeframe.clone(),
            auto_calculation: config.market.auto_calculation,
            ..AppState::default()
        };
        Self::new(source, state, config.market.limit).with_risk(config.risk)
    }

    /// Size every computed trade against this account.
    pub fn with_risk(mut self, risk: RiskConfig) -> Self {
        self.risk = Some(risk);
        self
    }

    pub fn state(&self) -> &StateCell {
        &self.state
    }

    pub fn current(&self) -> AppState {
        self.state.current()
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Takes effect on the next refresh.
    pub fn set_symbol(&self, symbol: &str) {
        self.state.update(|s| with_symbol(s, symbol));
    }

    pub fn set_timeframe(&self, timeframe: &str) {
        self.state.update(|s| with_timeframe(s, timeframe));
    }

    pub fn set_auto_calculation(&self, enabled: bool) {
        self.state.update(|s| with_auto_calculation(s, enabled));
        if enabled {
            self.state.info("Auto-calculation started.");
        } else {
            self.state.info("Auto-calculation stopped.");
        }
    }

    /// Fetch the current instrument and run the pipeline on the new candles.
    ///
    /// A failed fetch is logged, turns auto-calculation off, and is returned.
    pub fn refresh(&self) -> Result<PipelineOutput, DataError> {
        let AppState {
            current_symbol: symbol,
            current_timeframe: timeframe,
            auto_calculation,
            ..
        } = self.state.current();

        self.state.info(&format!(
            "Fetching {symbol} {timeframe} from {}...",
            self.source_name()
        ));

        match self.source.fetch(&symbol, &timeframe, self.limit) {
            Ok(candles) => {
                self.state
                    .success(&format!("Loaded {} candles for {symbol}", candles.len()));
                self.state.update(|s| with_candles(s, candles));
                Ok(self.run_pipeline())
            }
            Err(e) => {
                self.state.error(&format!("API Error: {e}"));
                if auto_calculation {
                    self.state.update(|s| with_auto_calculation(s, false));
                }
                Err(e)
            }
        }
    }

    /// Run the pipeline over the stored candles and apply the outcome.
    pub fn run_pipeline(&self) -> PipelineOutput {
        let candles = self.state.current().candles;
        let output = run_pipeline(&candles);

        match &output.decision {
            None => self.state.update(with_inert_pipeline),
            Some(decision) => {
                let indicators = output.indicators.clone();
                let gates = output.gates;
                let decision = self.sized(decision.clone());
                self.state.update(|s| with_indicators(s, indicators));
                self.state.update(|s| with_gates(s, gates));
                self.state.update(|s| with_decision(s, decision));
            }
        }
        output
    }

    fn sized(&self, decision: SignalDecision) -> SignalDecision {
        let Some(risk) = self.risk else {
            return decision;
        };
        SignalDecision {
            execution: decision.execution.map(|params| {
                PositionSizing::compute(&params, risk.account_size, risk.risk_percent)
                    .apply(&params)
            }),
            ..decision
        }
    }

    /// Forward-walk mini backtest over the stored candles.
    ///
    /// Insufficient history and zero setups leave the stored results untouched.
    pub fn run_mini_backtest(&self) -> Result<BacktestResults, BacktestError> {
        let candles = self.state.current().candles;
        let results = match run_forward_walk(&candles) {
            Ok(results) => results,
            Err(e) => {
                self.state.error(&e.to_string());
                return Err(e);
            }
        };

        if results.is_empty() {
            self.state.info("No qualifying setups found in sample window.");
            return Ok(results);
        }

        self.state.update(|s| with_backtest_results(s, results.clone()));
        self.state.success(&format!(
            "Mini backtest done: {} setups, hitRate {:.1}%, avgR {:.2}.",
            results.setups.len(),
            results.hit_rate,
            results.avg_r
        ));
        Ok(results)
    }

    /// Historical scan over the stored candles and indicators.
    ///
    /// Matches replace the stored results wholesale, statistics zeroed.
    pub fn generate_historical_setups(&self) -> Result<Vec<HistoricalSetup>, BacktestError> {
        let AppState {
            candles,
            indicators,
            ..
        } = self.state.current();
        let setups = match scan_historical_setups(&candles, &indicators) {
            Ok(setups) => setups,
            Err(e) => {
                self.state.error(&e.to_string());
                return Err(e);
            }
        };

        if setups.is_empty() {
            self.state.info("No historical setups matched criteria.");
            return Ok(setups);
        }

        let as_results: Vec<Setup> = setups.iter().copied().map(Setup::Historical).collect();
        self.state.update(|s| with_setups(s, as_results));
        self.state
            .success(&format!("Generated {} historical setups.", setups.len()));
        Ok(setups)
    }

    pub fn clear_backtest_results(&self) {
        self.state.update(cleared_backtest);
        self.state.info("Backtest results cleared.");
    }

    pub fn capture_snapshot(&self) -> Result<Snapshot> {
        let snapshot = Snapshot::capture(&self.state.current())?;
        self.state
            .success(&format!("Snapshot captured ({}).", snapshot.id()));
        Ok(snapshot)
    }

    /// Write a TradingView alert for the current trade into `dir`.
    pub fn export_alert(&self, dir: &Path) -> Result<PathBuf> {
        let state = self.state.current();
        let alert =
            TradingViewAlert::from_params(&state.execution_params, &state.current_symbol)?;
        let path = write_alert(&alert, dir, Utc::now())?;
        self.state.success("TradingView alert JSON file generated.");
        Ok(path)
    }

    /// Restore a snapshot, then re-run the pipeline so derived values match the candles.
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> PipelineOutput {
        self.state.update(|s| snapshot.restore(s));
        self.state
            .success(&format!("Snapshot imported ({}).", snapshot.id()));
        info!(id = snapshot.id(), "snapshot restored");
        self.run_pipeline()
    }
}
