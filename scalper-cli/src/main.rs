//! Scalper CLI — signal analysis, backtests and snapshots.
//!
//! Commands:
//! - `analyze` — fetch candles once, run the pipeline, print the signal panel
//! - `watch` — refresh on an interval while auto-calculation stays on
//! - `backtest` — forward-walk mini backtest over the latest candles
//! - `scan` — historical setup scan over the latest candles
//! - `snapshot export|import` — write or load a JSON state snapshot
//! - `alert` — write a TradingView alert file for the current trade

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use scalper_core::data::{
    load_candles_file, BybitProvider, CandleSource, CsvDirectorySource, DataError,
};
use scalper_core::domain::Candle;
use scalper_core::execution_params::PositionSizing;
use scalper_core::log::LogEntry;
use scalper_core::state::AppState;
use scalper_runner::report::{
    backtest_summary, format_price, order_ticket, signal_comment, signal_lines, trend_tag,
};
use scalper_runner::snapshot::{read_snapshot, write_snapshot};
use scalper_runner::{ScalperConfig, Session};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Seconds between refreshes in `watch`.
const DEFAULT_REFRESH_SECS: u64 = 90;

#[derive(Parser)]
#[command(name = "scalper", about = "Scalper — crypto scalping signal engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where candles come from and which instrument to ask for.
#[derive(Args, Clone)]
struct SourceArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Symbol (e.g., SOLUSDT). Overrides the config.
    #[arg(long)]
    symbol: Option<String>,

    /// Timeframe: 1m, 3m, 5m, 15m or 1h. Overrides the config.
    #[arg(long)]
    timeframe: Option<String>,

    /// Candles per fetch. Overrides the config.
    #[arg(long)]
    limit: Option<usize>,

    /// Read candles from a single CSV or JSON file instead of Bybit.
    #[arg(long, conflicts_with = "csv_dir")]
    input: Option<PathBuf>,

    /// Read candles from `{SYMBOL}_{timeframe}.csv` files in this directory.
    #[arg(long)]
    csv_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch candles once and print the signal panel.
    Analyze {
        #[command(flatten)]
        source: SourceArgs,

        /// Print gates, signal state and execution parameters as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Refresh on an interval until a fetch fails or the iteration count is reached.
    Watch {
        #[command(flatten)]
        source: SourceArgs,

        /// Seconds between refreshes.
        #[arg(long, default_value_t = DEFAULT_REFRESH_SECS)]
        interval: u64,

        /// Stop after this many refreshes.
        #[arg(long)]
        iterations: Option<usize>,

        /// Cycle through instruments, one per refresh: SYMBOL or SYMBOL:TIMEFRAME.
        #[arg(long, value_parser = parse_instrument)]
        rotate: Vec<Instrument>,
    },
    /// Forward-walk mini backtest over the latest candles.
    Backtest {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Historical setup scan over the latest candles.
    Scan {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Fetch, analyze, and write a TradingView alert file for the current trade.
    Alert {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory.
        #[arg(long, default_value = "alerts")]
        output_dir: PathBuf,
    },
    /// Snapshot export and import.
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// Fetch, analyze, and write a snapshot file.
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Also run the mini backtest before capturing.
        #[arg(long, default_value_t = false)]
        with_backtest: bool,

        /// Output directory.
        #[arg(long, default_value = "snapshots")]
        output_dir: PathBuf,
    },
    /// Load a snapshot file and print the restored signal panel.
    Import {
        /// Snapshot JSON file.
        path: PathBuf,

        /// Path to a TOML config file (risk settings for sizing).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { source, json } => run_analyze(&source, json),
        Commands::Watch {
            source,
            interval,
            iterations,
            rotate,
        } => run_watch(&source, interval, iterations, &rotate),
        Commands::Backtest { source } => run_backtest_cmd(&source),
        Commands::Scan { source } => run_scan(&source),
        Commands::Alert { source, output_dir } => run_alert(&source, &output_dir),
        Commands::Snapshot { action } => match action {
            SnapshotAction::Export {
                source,
                with_backtest,
                output_dir,
            } => run_snapshot_export(&source, with_backtest, &output_dir),
            SnapshotAction::Import { path, config } => {
                run_snapshot_import(&path, config.as_deref())
            }
        },
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ─── Session setup ──────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<ScalperConfig> {
    match path {
        Some(p) => ScalperConfig::load(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(ScalperConfig::default()),
    }
}

/// Config file first, then flag overrides, then validation.
fn resolve_config(args: &SourceArgs) -> Result<ScalperConfig> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(symbol) = &args.symbol {
        config.market.symbol = symbol.to_uppercase();
    }
    if let Some(timeframe) = &args.timeframe {
        config.market.timeframe = timeframe.clone();
    }
    if let Some(limit) = args.limit {
        config.market.limit = limit;
    }
    config.validate()?;
    Ok(config)
}

fn build_source(args: &SourceArgs, config: &ScalperConfig) -> Result<Box<dyn CandleSource>> {
    if let Some(path) = &args.input {
        return Ok(Box::new(FileSource::open(path)?));
    }
    if let Some(dir) = &args.csv_dir {
        return Ok(Box::new(CsvDirectorySource::new(dir)));
    }
    Ok(Box::new(BybitProvider::new(config.provider.clone())?))
}

fn open_session(args: &SourceArgs) -> Result<Session> {
    let config = resolve_config(args)?;
    let source = build_source(args, &config)?;
    let session = Session::from_config(source, &config);
    info!(
        symbol = %config.market.symbol,
        timeframe = %config.market.timeframe,
        source = session.source_name(),
        "session opened"
    );
    Ok(session)
}

/// A symbol with an optional timeframe override.
#[derive(Debug, Clone, PartialEq)]
struct Instrument {
    symbol: String,
    timeframe: Option<String>,
}

fn parse_instrument(raw: &str) -> Result<Instrument, String> {
    let (symbol, timeframe) = match raw.split_once(':') {
        Some((symbol, timeframe)) => (symbol, Some(timeframe.to_string())),
        None => (raw, None),
    };
    if symbol.is_empty() || timeframe.as_deref() == Some("") {
        return Err(format!("expected SYMBOL or SYMBOL:TIMEFRAME, got {raw:?}"));
    }
    Ok(Instrument {
        symbol: symbol.to_uppercase(),
        timeframe,
    })
}

/// A single candle file loaded up front; every fetch returns its tail.
struct FileSource {
    label: String,
    candles: Vec<Candle>,
}

impl FileSource {
    fn open(path: &Path) -> Result<Self> {
        let candles = load_candles_file(path)
            .with_context(|| format!("loading candles from {}", path.display()))?;
        Ok(Self {
            label: path.display().to_string(),
            candles,
        })
    }
}

impl CandleSource for FileSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn fetch(
        &self,
        _symbol: &str,
        _timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let start = self.candles.len().saturating_sub(limit);
        Ok(self.candles[start..].to_vec())
    }
}

// ─── Commands ───────────────────────────────────────────────────────

fn run_analyze(args: &SourceArgs, json: bool) -> Result<()> {
    let session = open_session(args)?;
    session.refresh()?;
    let state = session.current();

    if json {
        let payload = serde_json::json!({
            "symbol": state.current_symbol,
            "timeframe": state.current_timeframe,
            "signalEngine": state.signal_engine,
            "gates": state.gates,
            "executionParams": state.execution_params,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    print_panel(&state, load_config(args.config.as_deref())?);
    Ok(())
}

fn run_watch(
    args: &SourceArgs,
    interval: u64,
    iterations: Option<usize>,
    rotate: &[Instrument],
) -> Result<()> {
    let session = open_session(args)?;
    let config = resolve_config(args)?;
    session.set_auto_calculation(true);

    let mut done = 0usize;
    loop {
        if !rotate.is_empty() {
            let next = &rotate[done % rotate.len()];
            session.set_symbol(&next.symbol);
            if let Some(timeframe) = &next.timeframe {
                session.set_timeframe(timeframe);
            }
        }
        if let Err(e) = session.refresh() {
            warn!(error = %e, "refresh failed, auto-calculation stopped");
            print_last_log(&session.current());
            return Err(e.into());
        }
        print_panel(&session.current(), config.clone());
        done += 1;

        if iterations.is_some_and(|n| done >= n) || !session.current().auto_calculation {
            break;
        }
        std::thread::sleep(Duration::from_secs(interval));
    }

    session.set_auto_calculation(false);
    Ok(())
}

fn run_backtest_cmd(args: &SourceArgs) -> Result<()> {
    let session = open_session(args)?;
    session.refresh()?;
    let results = session.run_mini_backtest()?;
    print_last_log(&session.current());
    if !results.is_empty() {
        println!();
        println!("=== Mini Backtest ===");
        println!("{}", backtest_summary(&results));
    }
    Ok(())
}

fn run_scan(args: &SourceArgs) -> Result<()> {
    let session = open_session(args)?;
    session.refresh()?;
    let setups = session.generate_historical_setups()?;
    print_last_log(&session.current());
    if !setups.is_empty() {
        println!();
        println!("=== Historical Setups ===");
        println!("{}", backtest_summary(&session.current().backtest_results));
    }
    Ok(())
}

fn run_alert(args: &SourceArgs, output_dir: &Path) -> Result<()> {
    let session = open_session(args)?;
    session.refresh()?;
    let path = session.export_alert(output_dir)?;
    print_last_log(&session.current());
    println!("Alert saved to: {}", path.display());
    Ok(())
}

fn run_snapshot_export(args: &SourceArgs, with_backtest: bool, output_dir: &Path) -> Result<()> {
    let session = open_session(args)?;
    session.refresh()?;
    if with_backtest {
        session.run_mini_backtest()?;
    }
    let snapshot = session.capture_snapshot()?;
    let path = write_snapshot(&snapshot, output_dir)?;
    println!("Snapshot {} saved to: {}", snapshot.id(), path.display());
    Ok(())
}

fn run_snapshot_import(path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let snapshot = read_snapshot(path)?;

    // Restoring never fetches; the source only satisfies the session's shape.
    let source = FileSource {
        label: path.display().to_string(),
        candles: Vec::new(),
    };
    let session = Session::new(Box::new(source), AppState::default(), config.market.limit)
        .with_risk(config.risk);
    let output = session.import_snapshot(&snapshot);
    if output.is_inert() {
        warn!(id = snapshot.id(), "snapshot holds too few candles for a signal");
    }

    let state = session.current();
    print_panel(&state, config);
    if !state.backtest_results.is_empty() {
        println!("=== Stored Backtest ===");
        println!("{}", backtest_summary(&state.backtest_results));
    }
    Ok(())
}

// ─── Output ─────────────────────────────────────────────────────────

fn print_last_log(state: &AppState) {
    if let Some(LogEntry {
        level,
        message,
        timestamp,
    }) = state.last_log()
    {
        println!("[{timestamp}] {}: {message}", level.as_str());
    }
}

fn print_panel(state: &AppState, config: ScalperConfig) {
    let last_close = state.candles.last().map_or(0.0, |c| c.close);
    println!();
    println!(
        "=== {} {} ===",
        state.current_symbol, state.current_timeframe
    );
    println!("Last close:     {}", format_price(last_close));
    println!("Trend:          {}", trend_tag(&state.indicators).as_str());
    println!("Signal:         {}", state.signal_engine.as_str());
    println!(
        "Gates:          {}/4 [{}]",
        state.gates.passed_count(),
        state.gates.passed_labels().join(" ")
    );
    println!("{}", signal_comment(state.signal_engine, &state.gates));
    println!();
    for line in signal_lines(state) {
        println!("{line}");
    }
    println!("R:R {}", state.execution_params.risk_reward);

    if state.execution_params.direction.is_some() {
        let sizing = PositionSizing::compute(
            &state.execution_params,
            config.risk.account_size,
            config.risk.risk_percent,
        );
        println!();
        println!(
            "{}",
            order_ticket(&state.execution_params, &state.current_symbol, &sizing)
        );
    }
    println!();
}
