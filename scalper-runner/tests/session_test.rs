//! Session scenarios against an in-memory candle source.
//!
//! Covers the refresh path (success and failure), the inert pipeline below the
//! candle floor, instrument switches, both backtest routines, clearing
//! results, a snapshot written to disk and imported into a fresh session, and
//! a TradingView alert file.

use scalper_core::data::{CandleSource, DataError};
use scalper_core::domain::{Candle, Setup, SignalState};
use scalper_core::log::LogLevel;
use scalper_core::state::AppState;
use scalper_runner::alert::read_alert;
use scalper_runner::snapshot::{read_snapshot, write_snapshot};
use scalper_runner::{BacktestError, RiskConfig, ScalperConfig, Session};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

enum Canned {
    Candles(Vec<Candle>),
    Failure(&'static str),
}

struct CannedSource(Canned);

impl CandleSource for CannedSource {
    fn name(&self) -> &str {
        "canned"
    }

    fn fetch(
        &self,
        _symbol: &str,
        _timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        match &self.0 {
            Canned::Candles(candles) => {
                let start = candles.len().saturating_sub(limit);
                Ok(candles[start..].to_vec())
            }
            Canned::Failure(msg) => Err(DataError::Upstream((*msg).to_string())),
        }
    }
}

fn session_over(candles: Vec<Candle>) -> Session {
    Session::new(
        Box::new(CannedSource(Canned::Candles(candles))),
        AppState::default(),
        1000,
    )
}

fn candle(i: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
    Candle {
        time: 1_700_000_000_000 + i as i64 * 300_000,
        open,
        high,
        low,
        close,
        volume,
    }
}

fn rising(n: usize) -> Vec<Candle> {
    (0..n)
        .map(|i| {
            let close = 100.0 + i as f64;
            let open = close - 1.0;
            candle(i, open, close + 0.5, open - 0.5, close, 1000.0)
        })
        .collect()
}

/// Rise, ten bars pausing at 150, then a wide breakout bar on heavy volume.
fn breakout() -> Vec<Candle> {
    let mut candles = rising(50);
    for i in 50..60 {
        candles.push(candle(i, 150.0, 150.5, 149.5, 150.0, 1000.0));
    }
    candles.push(candle(60, 150.9, 161.0, 141.0, 151.0, 5000.0));
    candles
}

/// 120 bars with a single breakout at index 100.
fn scan_history() -> Vec<Candle> {
    let mut candles = rising(90);
    for i in 90..100 {
        candles.push(candle(i, 190.0, 190.5, 189.5, 190.0, 1000.0));
    }
    candles.push(candle(100, 190.9, 201.0, 181.0, 191.0, 5000.0));
    for i in 101..120 {
        candles.push(candle(i, 191.0, 191.5, 190.5, 191.0, 1000.0));
    }
    candles
}

fn last_message(session: &Session) -> (LogLevel, String) {
    let state = session.current();
    let entry = state.last_log().expect("a log entry");
    (entry.level, entry.message.clone())
}

// ──────────────────────────────────────────────
// Refresh
// ──────────────────────────────────────────────

#[test]
fn refresh_runs_pipeline_to_entry() {
    let session = session_over(breakout());
    let output = session.refresh().unwrap();
    assert!(!output.is_inert());

    let state = session.current();
    assert_eq!(state.candles.len(), 61);
    assert_eq!(state.signal_engine, SignalState::Entry);
    assert_eq!(state.gates.passed_count(), 4);
    assert!(state.execution_params.entry > 0.0);

    let messages: Vec<&str> = state.logs.iter().map(|l| l.message.as_str()).collect();
    assert_eq!(messages[0], "Fetching SOLUSDT 5m from canned...");
    assert_eq!(messages[1], "Loaded 61 candles for SOLUSDT");
}

#[test]
fn failed_fetch_stops_auto_calculation() {
    let session = Session::new(
        Box::new(CannedSource(Canned::Failure("Rate limit exceeded"))),
        AppState::default(),
        200,
    );
    assert!(session.current().auto_calculation);

    let err = session.refresh().unwrap_err();
    assert_eq!(err.to_string(), "Rate limit exceeded");

    let state = session.current();
    assert!(!state.auto_calculation);
    assert!(state.candles.is_empty());
    assert_eq!(
        last_message(&session),
        (LogLevel::Error, "API Error: Rate limit exceeded".to_string())
    );
}

#[test]
fn below_floor_is_inert_and_keeps_execution_params() {
    let session = session_over(breakout());
    session.refresh().unwrap();
    let entry = session.current().execution_params.entry;

    let short = Session::new(
        Box::new(CannedSource(Canned::Candles(rising(30)))),
        session.current(),
        1000,
    );
    let output = short.refresh().unwrap();
    assert!(output.is_inert());

    let state = short.current();
    assert_eq!(state.signal_engine, SignalState::NoTrade);
    assert_eq!(state.gates.passed_count(), 0);
    assert!(state.indicators.ema8.is_empty());
    assert_eq!(state.execution_params.entry, entry);
}

#[test]
fn risk_config_sizes_the_trade() {
    let session = session_over(breakout()).with_risk(RiskConfig {
        account_size: 10_000.0,
        risk_percent: 1.0,
    });
    session.refresh().unwrap();
    let params = session.current().execution_params;
    let per_unit = (params.entry - params.stop_loss).abs();
    let size = params.position_size.expect("position size");
    assert!((size * per_unit - 100.0).abs() < 1e-6);
}

#[test]
fn config_seeds_instrument() {
    let mut config = ScalperConfig::default();
    config.market.symbol = "BTCUSDT".into();
    config.market.timeframe = "1m".into();
    let session = Session::from_config(
        Box::new(CannedSource(Canned::Candles(breakout()))),
        &config,
    );
    session.refresh().unwrap();
    let state = session.current();
    assert_eq!(state.current_symbol, "BTCUSDT");
    assert_eq!(state.logs[0].message, "Fetching BTCUSDT 1m from canned...");
}

#[test]
fn switched_instrument_is_fetched_next() {
    let session = session_over(breakout());
    assert_eq!(session.source_name(), "canned");
    session.set_symbol("ETHUSDT");
    session.set_timeframe("15m");
    session.refresh().unwrap();

    let state = session.current();
    assert_eq!(state.current_symbol, "ETHUSDT");
    assert_eq!(state.current_timeframe, "15m");
    assert_eq!(state.logs[0].message, "Fetching ETHUSDT 15m from canned...");
}

// ──────────────────────────────────────────────
// Backtests
// ──────────────────────────────────────────────

#[test]
fn mini_backtest_replaces_results() {
    let session = session_over(rising(100));
    session.refresh().unwrap();

    let results = session.run_mini_backtest().unwrap();
    assert_eq!(results.setups.len(), 20);
    assert_eq!(session.current().backtest_results, results);
    assert_eq!(
        last_message(&session),
        (
            LogLevel::Success,
            "Mini backtest done: 20 setups, hitRate 100.0%, avgR 2.00.".to_string()
        )
    );
}

#[test]
fn mini_backtest_insufficient_history_keeps_results() {
    let session = session_over(rising(100));
    session.refresh().unwrap();
    let before = session.run_mini_backtest().unwrap();

    let short = Session::new(
        Box::new(CannedSource(Canned::Candles(rising(60)))),
        session.current(),
        1000,
    );
    short.refresh().unwrap();
    let err = short.run_mini_backtest().unwrap_err();
    assert!(matches!(
        err,
        BacktestError::InsufficientHistory { required: 80, actual: 60, .. }
    ));
    assert_eq!(short.current().backtest_results, before);
    assert_eq!(last_message(&short).0, LogLevel::Error);
}

#[test]
fn historical_scan_stores_setups_with_zeroed_stats() {
    let session = session_over(scan_history());
    session.refresh().unwrap();

    let setups = session.generate_historical_setups().unwrap();
    assert_eq!(setups.len(), 1);

    let results = session.current().backtest_results;
    assert_eq!(results.setups, vec![Setup::Historical(setups[0])]);
    assert_eq!(results.hit_rate, 0.0);
    assert_eq!(results.avg_r, 0.0);
    assert_eq!(
        last_message(&session).1,
        "Generated 1 historical setups."
    );

    session.clear_backtest_results();
    assert!(session.current().backtest_results.is_empty());
}

#[test]
fn historical_scan_without_matches_leaves_results() {
    let session = session_over(rising(150));
    session.refresh().unwrap();
    session.run_mini_backtest().unwrap();
    let before = session.current().backtest_results;

    // A steady climb never closes on its own midpoint.
    let setups = session.generate_historical_setups().unwrap();
    assert!(setups.is_empty());
    assert_eq!(session.current().backtest_results, before);
    assert_eq!(
        last_message(&session).1,
        "No historical setups matched criteria."
    );
}

// ──────────────────────────────────────────────
// Snapshots
// ──────────────────────────────────────────────

#[test]
fn snapshot_survives_disk_and_restores_session() {
    let session = session_over(breakout());
    session.refresh().unwrap();
    let snapshot = session.capture_snapshot().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(&snapshot, dir.path()).unwrap();
    assert!(path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("snapshot_SOLUSDT_5m_")));

    let loaded = read_snapshot(&path).unwrap();
    assert_eq!(loaded.id(), snapshot.id());
    assert_eq!(loaded.meta, snapshot.meta);
    assert_eq!(loaded.state.candles, snapshot.state.candles);

    let fresh = Session::new(
        Box::new(CannedSource(Canned::Failure("offline"))),
        AppState::default(),
        200,
    );
    let output = fresh.import_snapshot(&loaded);
    assert!(!output.is_inert());

    let restored = fresh.current();
    let captured = session.current();
    assert_eq!(restored.candles, captured.candles);
    assert_eq!(restored.signal_engine, SignalState::Entry);
    assert_eq!(restored.gates, captured.gates);
    assert_eq!(restored.execution_params, captured.execution_params);
}

// ──────────────────────────────────────────────
// Alerts
// ──────────────────────────────────────────────

#[test]
fn alert_file_carries_current_trade() {
    let session = session_over(breakout());
    session.refresh().unwrap();
    let params = session.current().execution_params;

    let dir = tempfile::tempdir().unwrap();
    let path = session.export_alert(dir.path()).unwrap();
    assert!(path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("TV_Alert_SOLUSDT_") && n.ends_with(".json")));

    let alert = read_alert(&path).unwrap();
    assert_eq!(alert.symbol, "SOLUSDT");
    assert_eq!(alert.side, "buy");
    assert_eq!(alert.entry, params.entry.to_string());
    assert_eq!(alert.take_profit_2, params.tp2.to_string());
    assert_eq!(
        last_message(&session),
        (
            LogLevel::Success,
            "TradingView alert JSON file generated.".to_string()
        )
    );
}

#[test]
fn alert_needs_a_computed_trade() {
    let session = session_over(rising(30));
    session.refresh().unwrap();
    let dir = tempfile::tempdir().unwrap();
    assert!(session.export_alert(dir.path()).is_err());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
