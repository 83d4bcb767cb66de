//! Forward-walk mini backtest.
//!
//! Samples up to 20 long setups from the most recent 200 candles using an SMA
//! stack (5 > 8 > 13) as a cheap trend proxy, then walks each one forward up to
//! 30 bars to see whether the stop or the 2R target is touched first.

use scalper_core::domain::{BacktestResults, Candle, SampledSetup, Setup};
use scalper_core::indicators::trailing_mean;
use tracing::debug;

use crate::backtest::{require_history, BacktestError, Routine};
use crate::metrics::BacktestStats;

pub const FORWARD_WALK_MIN_CANDLES: usize = 80;
/// Most recent candles considered.
pub const SAMPLE_WINDOW: usize = 200;
pub const MAX_SAMPLES: usize = 20;
/// First bar that can host a setup; the proxy window needs 15 closes.
pub const FIRST_BAR: usize = 14;
/// Bars kept free at the end of the segment.
pub const TAIL_BARS: usize = 5;
pub const HORIZON_BARS: usize = 30;
pub const TARGET_R: f64 = 2.0;
pub const STOP_R: f64 = -1.0;

const SMA_FAST: usize = 5;
const SMA_MID: usize = 8;
const SMA_SLOW: usize = 13;

/// Run the mini backtest over `candles`.
///
/// Zero qualifying setups is not an error: the results are empty with zeroed
/// statistics.
pub fn run_forward_walk(candles: &[Candle]) -> Result<BacktestResults, BacktestError> {
    require_history(Routine::ForwardWalk, FORWARD_WALK_MIN_CANDLES, candles.len())?;

    let window = SAMPLE_WINDOW.min(candles.len() - 1);
    let segment = &candles[candles.len() - window..];
    let samples = sample_setups(segment);

    let rs: Vec<f64> = samples.iter().map(|s| s.r).collect();
    let stats = BacktestStats::compute(&rs);
    debug!(
        segment = segment.len(),
        setups = samples.len(),
        hit_rate = stats.hit_rate,
        "forward walk complete"
    );

    Ok(stats.into_results(samples.into_iter().map(Setup::Sampled).collect()))
}

/// Every qualifying setup in `segment`, in bar order, at most [`MAX_SAMPLES`].
pub fn sample_setups(segment: &[Candle]) -> Vec<SampledSetup> {
    let mut setups = Vec::new();
    let end = segment.len().saturating_sub(TAIL_BARS);

    for i in FIRST_BAR..end {
        if setups.len() >= MAX_SAMPLES {
            break;
        }
        if !sma_stack_rising(segment, i) {
            continue;
        }

        let entry = segment[i].close;
        let atr_like = bar_range(&segment[i], segment[i - 1].close);
        let stop = entry - atr_like;
        let tp = entry + TARGET_R * atr_like;
        let r = resolve_outcome(segment, i, entry, stop, tp);
        setups.push(SampledSetup { entry, stop, tp, r });
    }

    setups
}

/// fast > mid > slow over the closes `i-14..=i`.
fn sma_stack_rising(segment: &[Candle], i: usize) -> bool {
    let recent: Vec<f64> = segment[i - FIRST_BAR..=i].iter().map(|c| c.close).collect();
    match (
        trailing_mean(&recent, SMA_FAST),
        trailing_mean(&recent, SMA_MID),
        trailing_mean(&recent, SMA_SLOW),
    ) {
        (Some(fast), Some(mid), Some(slow)) => fast > mid && mid > slow,
        _ => false,
    }
}

/// Single-bar true range against the previous close.
fn bar_range(bar: &Candle, prev_close: f64) -> f64 {
    (bar.high - bar.low)
        .max(bar.high - prev_close)
        .max(prev_close - bar.low)
}

/// R-multiple of the setup opened at bar `i`.
///
/// Bars `i+1` up to (excluding) `i+30` are checked in order, stop before
/// target within a bar. Without a hit, the close at `min(i+30, last)` is
/// marked against the initial risk.
pub fn resolve_outcome(segment: &[Candle], i: usize, entry: f64, stop: f64, tp: f64) -> f64 {
    let horizon_end = segment.len().min(i + HORIZON_BARS);
    for bar in segment.iter().take(horizon_end).skip(i + 1) {
        if bar.low <= stop {
            return STOP_R;
        }
        if bar.high >= tp {
            return TARGET_R;
        }
    }
    let mark = segment[(i + HORIZON_BARS).min(segment.len() - 1)].close;
    (mark - entry) / (entry - stop)
}
