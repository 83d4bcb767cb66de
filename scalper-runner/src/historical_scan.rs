//! Historical setup scanner.
//!
//! Replays the four gates bar by bar from index 60 and records every bar where
//! all of them pass. Outcomes are not simulated here.
//!
//! Each indicator is read at its own offset. ATR is the exception: it is read
//! at `i - 14` regardless of the live gate's one-bar lag.

use scalper_core::domain::{Candle, Direction, HistoricalSetup};
use scalper_core::gates::{break_of_structure, retest_zone, STRUCTURE_LOOKBACK};
use scalper_core::indicators::IndicatorSet;
use tracing::debug;

use crate::backtest::{require_history, BacktestError, Routine};

pub const SCAN_MIN_CANDLES: usize = 120;
pub const SCAN_START: usize = 60;
pub const MAX_HISTORICAL_SETUPS: usize = 100;
/// Candle-to-ATR index lag used by the scan.
pub const SCAN_ATR_LAG: usize = 14;

/// Scan `candles` for bars where all four gates pass, at most 100.
pub fn scan_historical_setups(
    candles: &[Candle],
    indicators: &IndicatorSet,
) -> Result<Vec<HistoricalSetup>, BacktestError> {
    require_history(Routine::HistoricalScan, SCAN_MIN_CANDLES, candles.len())?;

    let mut setups = Vec::new();
    for i in SCAN_START..candles.len() {
        if setups.len() >= MAX_HISTORICAL_SETUPS {
            break;
        }
        if let Some(setup) = evaluate_bar(candles, indicators, i) {
            setups.push(setup);
        }
    }

    debug!(candles = candles.len(), setups = setups.len(), "historical scan complete");
    Ok(setups)
}

/// The setup at bar `i`, or `None` when any gate fails or any input is out of range.
fn evaluate_bar(
    candles: &[Candle],
    indicators: &IndicatorSet,
    i: usize,
) -> Option<HistoricalSetup> {
    let e8 = *indicators.ema8.at(i)?;
    let e21 = *indicators.ema21.at(i)?;
    let e50 = *indicators.ema50.at(i)?;
    let direction = if e8 > e21 && e21 > e50 {
        Direction::Long
    } else if e8 < e21 && e21 < e50 {
        Direction::Short
    } else {
        return None;
    };

    let candle = candles[i];
    let close = candle.close;
    let start = i.checked_sub(STRUCTURE_LOOKBACK)?;
    if !break_of_structure(&candles[start..i], close).any() {
        return None;
    }

    let atr = *indicators.atr14.get(i.checked_sub(SCAN_ATR_LAG)?)?;
    if !retest_zone(&candles[start..=i], close, atr).in_zone {
        return None;
    }

    let volume = indicators.volume.at(i)?;
    if !(volume.spike && volume.absorption) {
        return None;
    }

    let entry = close;
    let stop = entry - direction.sign() * atr;
    let risk = (entry - stop).abs();
    Some(HistoricalSetup {
        time: candle.time,
        direction,
        entry,
        stop,
        tp1: entry + direction.sign() * risk,
        tp2: entry + direction.sign() * 2.0 * risk,
        atr,
        volume_ratio: volume.ratio,
        ema8: e8,
        ema21: e21,
        ema50: e50,
    })
}
