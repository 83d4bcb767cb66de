//! Scalper Runner — backtests, session orchestration, snapshots, configuration.
//!
//! This crate builds on `scalper-core` to provide:
//! - Forward-walk mini backtest and historical setup scanner
//! - Backtest statistics (hit rate, expectancy, drawdown, variance)
//! - A session binding a candle source to the state cell and log
//! - Snapshot artifacts with content-hash ids
//! - TradingView alert files
//! - TOML configuration and text reports

pub mod alert;
pub mod backtest;
pub mod config;
pub mod forward_walk;
pub mod historical_scan;
pub mod metrics;
pub mod report;
pub mod session;
pub mod snapshot;

pub use alert::TradingViewAlert;
pub use backtest::{BacktestError, Routine};
pub use config::{ConfigError, MarketConfig, RiskConfig, ScalperConfig};
pub use forward_walk::run_forward_walk;
pub use historical_scan::scan_historical_setups;
pub use metrics::BacktestStats;
pub use session::Session;
pub use snapshot::{Snapshot, SnapshotMeta, SnapshotState, SCHEMA_VERSION};
