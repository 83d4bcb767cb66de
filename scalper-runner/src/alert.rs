//! TradingView alert files built from the current execution parameters.
//!
//! Prices are written as strings, the shape TradingView webhook templates expect.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use scalper_core::domain::{Direction, ExecutionParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingViewAlert {
    pub name: String,
    pub symbol: String,
    /// `buy` or `sell`.
    pub side: String,
    pub entry: String,
    pub stop_loss: String,
    pub take_profit_1: String,
    pub take_profit_2: String,
}

impl TradingViewAlert {
    /// Alert for the trade in `params`. Fails when no direction has been computed.
    pub fn from_params(params: &ExecutionParams, symbol: &str) -> Result<Self> {
        let Some(direction) = params.direction else {
            bail!("no trade direction computed for {symbol}");
        };
        let side = match direction {
            Direction::Long => "buy",
            Direction::Short => "sell",
        };
        Ok(Self {
            name: format!("Scalper Pro Alert: {} {symbol}", direction.as_str()),
            symbol: symbol.to_string(),
            side: side.to_string(),
            entry: params.entry.to_string(),
            stop_loss: params.stop_loss.to_string(),
            take_profit_1: params.tp1.to_string(),
            take_profit_2: params.tp2.to_string(),
        })
    }

    /// `TV_Alert_{symbol}_{YYYY-MM-DD_HH:MM}.json`, minutes in UTC.
    pub fn file_name(&self, now: DateTime<Utc>) -> String {
        format!("TV_Alert_{}_{}.json", self.symbol, now.format("%Y-%m-%d_%H:%M"))
    }
}

/// Write `alert` into `dir`, named for the capture minute.
pub fn write_alert(alert: &TradingViewAlert, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;
    let path = dir.join(alert.file_name(now));
    let json = serde_json::to_string_pretty(alert).context("failed to serialize alert")?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

pub fn read_alert(path: &Path) -> Result<TradingViewAlert> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).context("invalid alert format")
}
