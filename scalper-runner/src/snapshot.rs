//! Snapshot artifacts — JSON capture of the session state.
//!
//! A snapshot holds the raw candles, the derived values and the last log entry,
//! plus metadata naming the instrument and the signal state at capture time.
//! Every artifact carries a `schemaVersion`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use scalper_core::domain::{BacktestResults, Candle, ExecutionParams, Gates, SignalState};
use scalper_core::indicators::IndicatorSet;
use scalper_core::log::LogEntry;
use scalper_core::state::AppState;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Hex characters kept from the content hash.
const ID_LEN: usize = 16;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub meta: Option<SnapshotMeta>,
    pub state: SnapshotState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub id: String,
    /// UTC ISO-8601 with `:` replaced by `-`, usable in file names.
    pub timestamp: String,
    pub symbol: String,
    pub timeframe: String,
    pub engine: SignalState,
}

/// Captured state. Every field is optional on import; absent ones keep the
/// session's current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candles: Option<Vec<Candle>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_params: Option<ExecutionParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicators: Option<IndicatorSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gates: Option<Gates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_engine: Option<SignalState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backtest_results: Option<BacktestResults>,
    pub last_log: Option<LogEntry>,
}

impl Snapshot {
    /// Capture `state` now.
    pub fn capture(state: &AppState) -> Result<Self> {
        Self::capture_at(state, Utc::now())
    }

    /// Capture `state` with an explicit capture time.
    pub fn capture_at(state: &AppState, now: DateTime<Utc>) -> Result<Self> {
        let captured = SnapshotState {
            candles: Some(state.candles.clone()),
            execution_params: Some(state.execution_params.clone()),
            indicators: Some(state.indicators.clone()),
            gates: Some(state.gates),
            signal_engine: Some(state.signal_engine),
            backtest_results: Some(state.backtest_results.clone()),
            last_log: state.last_log().cloned(),
        };
        let timestamp = file_safe_timestamp(now);
        let id = content_id(&captured, &timestamp)?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            meta: Some(SnapshotMeta {
                id,
                timestamp,
                symbol: state.current_symbol.clone(),
                timeframe: state.current_timeframe.clone(),
                engine: state.signal_engine,
            }),
            state: captured,
        })
    }

    pub fn id(&self) -> &str {
        self.meta.as_ref().map_or("unknown", |m| m.id.as_str())
    }

    /// `snapshot_{symbol}_{timeframe}_{timestamp}.json`.
    pub fn file_name(&self) -> String {
        match &self.meta {
            Some(m) => format!("snapshot_{}_{}_{}.json", m.symbol, m.timeframe, m.timestamp),
            None => "snapshot.json".to_string(),
        }
    }

    /// Apply this snapshot to `state`. Absent fields keep their current value.
    pub fn restore(&self, state: AppState) -> AppState {
        let s = &self.state;
        let (symbol, timeframe) = match &self.meta {
            Some(m) => (m.symbol.clone(), m.timeframe.clone()),
            None => (state.current_symbol.clone(), state.current_timeframe.clone()),
        };
        AppState {
            current_symbol: non_empty_or(symbol, &state.current_symbol),
            current_timeframe: non_empty_or(timeframe, &state.current_timeframe),
            candles: s.candles.clone().unwrap_or(state.candles.clone()),
            execution_params: s
                .execution_params
                .clone()
                .unwrap_or(state.execution_params.clone()),
            indicators: s.indicators.clone().unwrap_or(state.indicators.clone()),
            gates: s.gates.unwrap_or(state.gates),
            signal_engine: s.signal_engine.unwrap_or(state.signal_engine),
            backtest_results: s
                .backtest_results
                .clone()
                .unwrap_or(state.backtest_results.clone()),
            ..state
        }
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

/// `2026-10-18T09:15:02.123Z` → `2026-10-18T09-15-02.123Z`.
pub fn file_safe_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace(':', "-")
}

/// First 16 hex characters of a blake3 hash over the captured state and timestamp.
fn content_id(state: &SnapshotState, timestamp: &str) -> Result<String> {
    let json = serde_json::to_string(state).context("failed to serialize snapshot state")?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(json.as_bytes());
    hasher.update(timestamp.as_bytes());
    let hex = hasher.finalize().to_hex();
    Ok(hex[..ID_LEN].to_string())
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(snapshot: &Snapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).context("failed to serialize snapshot to JSON")
}

/// Parse a snapshot, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<Snapshot> {
    let snapshot: Snapshot =
        serde_json::from_str(json).context("invalid snapshot format")?;
    if snapshot.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            snapshot.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(snapshot)
}

/// Write `snapshot` into `dir` under its canonical file name.
pub fn write_snapshot(snapshot: &Snapshot, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;
    let path = dir.join(snapshot.file_name());
    std::fs::write(&path, export_json(snapshot)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
