//! Four-gate signal qualification.
//!
//! Live gates look at the latest bar only:
//! 1. Trend stack: EMA8/21/50 strictly ordered and price through the fast EMA
//! 2. Break of structure: close beyond the prior 10-bar swing high/low
//! 3. 50% retest: close within 0.25×ATR of the 11-bar impulse midpoint
//! 4. Volume: spike and wick absorption on the latest volume analysis
//!
//! A gate without enough history for its own window is `false`, never an error.
//! The per-bar BOS and retest series are exposed for charting and scans.

use serde::{Deserialize, Serialize};

use crate::domain::{highest_high, lowest_low, Candle, Gates};
use crate::indicators::IndicatorSet;

/// Prior bars forming the swing window and the retest impulse window.
pub const STRUCTURE_LOOKBACK: usize = 10;

/// Minimum candles before the retest series produces values.
pub const RETEST_MIN_CANDLES: usize = 20;

/// Fraction of ATR accepted around the impulse midpoint.
pub const RETEST_TOLERANCE_ATR: f64 = 0.25;

/// Break-of-structure flags for one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BosSignal {
    pub bullish: bool,
    pub bearish: bool,
}

impl BosSignal {
    pub fn any(&self) -> bool {
        self.bullish || self.bearish
    }
}

/// 50%-retest zone for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetestSignal {
    pub in_zone: bool,
    pub mid: f64,
    pub tolerance: f64,
}

/// Swing high/low of `prior` compared against `close`.
pub fn break_of_structure(prior: &[Candle], close: f64) -> BosSignal {
    BosSignal {
        bullish: close > highest_high(prior),
        bearish: close < lowest_low(prior),
    }
}

/// Impulse midpoint of `window` (prior bars plus the current one) and whether
/// `close` sits within `RETEST_TOLERANCE_ATR × atr` of it.
pub fn retest_zone(window: &[Candle], close: f64, atr: f64) -> RetestSignal {
    let mid = (highest_high(window) + lowest_low(window)) / 2.0;
    let tolerance = RETEST_TOLERANCE_ATR * atr;
    RetestSignal {
        in_zone: close >= mid - tolerance && close <= mid + tolerance,
        mid,
        tolerance,
    }
}

/// BOS flags for every bar from `lookback` on. `result[k]` belongs to candle `k + lookback`.
///
/// Empty when fewer than `lookback + 5` candles exist.
pub fn bos_series(candles: &[Candle], lookback: usize) -> Vec<BosSignal> {
    if candles.len() < lookback + 5 {
        return Vec::new();
    }
    (lookback..candles.len())
        .map(|i| break_of_structure(&candles[i - lookback..i], candles[i].close))
        .collect()
}

/// Retest flags for every bar from `STRUCTURE_LOOKBACK` on.
/// `result[k]` belongs to candle `k + STRUCTURE_LOOKBACK`.
///
/// The ATR for candle `i` is read at ATR-series index `i - 1`, clamped to the
/// last ATR value. Empty when fewer than 20 candles or no ATR values exist.
pub fn retest_series(candles: &[Candle], atr: &[f64]) -> Vec<RetestSignal> {
    if candles.len() < RETEST_MIN_CANDLES || atr.is_empty() {
        return Vec::new();
    }
    (STRUCTURE_LOOKBACK..candles.len())
        .map(|i| {
            let current_atr = atr[(i - 1).min(atr.len() - 1)];
            retest_zone(
                &candles[i - STRUCTURE_LOOKBACK..=i],
                candles[i].close,
                current_atr,
            )
        })
        .collect()
}

/// Latest close, or `None` when no usable price exists (no candles, zero, NaN).
pub fn current_price(candles: &[Candle]) -> Option<f64> {
    candles
        .last()
        .map(|c| c.close)
        .filter(|p| *p != 0.0 && !p.is_nan())
}

/// Trend-stack gate on the latest EMA values.
///
/// Ordering alone is not enough: price must also sit beyond the fast EMA in
/// the stack's direction.
pub fn trend_stack(indicators: &IndicatorSet, price: Option<f64>) -> bool {
    let (Some(e8), Some(e21), Some(e50)) = (
        indicators.ema8.last_value(),
        indicators.ema21.last_value(),
        indicators.ema50.last_value(),
    ) else {
        return false;
    };
    let Some(price) = price else {
        return false;
    };

    let short = e8 < e21 && e21 < e50;
    let long = e8 > e21 && e21 > e50;
    if short {
        price < e8
    } else if long {
        price > e8
    } else {
        false
    }
}

/// Volume gate: spike and absorption on the latest volume analysis.
pub fn volume_gate(indicators: &IndicatorSet) -> bool {
    indicators
        .volume
        .last()
        .is_some_and(|v| v.spike && v.absorption)
}

/// Evaluate all four gates for the latest bar.
pub fn validate_gates(candles: &[Candle], indicators: &IndicatorSet) -> Gates {
    if indicators.ema8.is_empty() {
        return Gates::default();
    }

    let bos_direction = bos_series(candles, STRUCTURE_LOOKBACK)
        .last()
        .is_some_and(BosSignal::any);
    let fifty_percent_retest = retest_series(candles, indicators.atr14.values())
        .last()
        .is_some_and(|r| r.in_zone);

    Gates {
        trend_stack: trend_stack(indicators, current_price(candles)),
        bos_direction,
        fifty_percent_retest,
        volume_spike: volume_gate(indicators),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{calculate_all_indicators, make_candles, Series, VolumeAnalysis};

    fn ema_only(e8: f64, e21: f64, e50: f64) -> IndicatorSet {
        IndicatorSet {
            ema8: Series::new(vec![e8], 0),
            ema21: Series::new(vec![e21], 0),
            ema50: Series::new(vec![e50], 0),
            ..IndicatorSet::default()
        }
    }

    #[test]
    fn trend_stack_needs_price_through_fast_ema() {
        let long = ema_only(103.0, 102.0, 101.0);
        assert!(trend_stack(&long, Some(104.0)));
        assert!(!trend_stack(&long, Some(102.5)));

        let short = ema_only(99.0, 100.0, 101.0);
        assert!(trend_stack(&short, Some(98.0)));
        assert!(!trend_stack(&short, Some(99.5)));

        let tangled = ema_only(100.0, 102.0, 101.0);
        assert!(!trend_stack(&tangled, Some(200.0)));
    }

    #[test]
    fn trend_stack_without_price_is_false() {
        let long = ema_only(103.0, 102.0, 101.0);
        assert!(!trend_stack(&long, None));
        assert_eq!(current_price(&[]), None);
        let mut candles = make_candles(&[0.0]);
        assert_eq!(current_price(&candles), None);
        candles[0].close = 5.0;
        assert_eq!(current_price(&candles), Some(5.0));
    }

    #[test]
    fn bos_series_alignment_and_floor() {
        assert!(bos_series(&make_candles(&[100.0; 14]), 10).is_empty());

        let mut closes = vec![100.0; 15];
        closes[14] = 110.0;
        let candles = make_candles(&closes);
        let series = bos_series(&candles, 10);
        assert_eq!(series.len(), 5);
        assert!(series[4].bullish);
        assert!(!series[4].bearish);
        assert!(!series[0].any());
    }

    #[test]
    fn bos_excludes_current_bar_from_swing() {
        // Current high is part of its own bar only; the close beats the prior highs.
        let prior = make_candles(&[100.0; 10]);
        assert!(break_of_structure(&prior, 101.5).bullish);
        assert!(!break_of_structure(&prior, 101.0).bullish);
        assert!(break_of_structure(&prior, 98.5).bearish);
    }

    #[test]
    fn retest_zone_bounds_inclusive() {
        let window = make_candles(&[100.0; 11]);
        // high 101, low 99 → mid 100; tolerance 0.25 × 4 = 1
        let zone = retest_zone(&window, 101.0, 4.0);
        assert!(zone.in_zone);
        assert_eq!(zone.mid, 100.0);
        assert_eq!(zone.tolerance, 1.0);
        assert!(!retest_zone(&window, 101.01, 4.0).in_zone);
    }

    #[test]
    fn retest_series_clamps_atr_index() {
        let candles = make_candles(&[100.0; 20]);
        // ATR series shorter than the candle index: the last value is used.
        let series = retest_series(&candles, &[0.0, 8.0]);
        assert_eq!(series.len(), 10);
        assert_eq!(series[9].tolerance, 2.0);
        assert!(retest_series(&candles, &[]).is_empty());
        assert!(retest_series(&candles[..19], &[1.0]).is_empty());
    }

    #[test]
    fn volume_gate_needs_spike_and_absorption() {
        let mut set = IndicatorSet::default();
        assert!(!volume_gate(&set));
        set.volume = Series::new(
            vec![VolumeAnalysis {
                ratio: 2.0,
                spike: true,
                absorption: false,
                avg_volume: 1.0,
            }],
            0,
        );
        assert!(!volume_gate(&set));
        set.volume = Series::new(
            vec![VolumeAnalysis {
                ratio: 2.0,
                spike: true,
                absorption: true,
                avg_volume: 1.0,
            }],
            0,
        );
        assert!(volume_gate(&set));
    }

    #[test]
    fn empty_indicators_fail_all_gates() {
        let candles = make_candles(&[100.0; 60]);
        assert_eq!(
            validate_gates(&candles, &IndicatorSet::default()),
            Gates::default()
        );
    }

    #[test]
    fn rising_closes_pass_trend_and_bos() {
        // Half-point wicks so each close clears the prior highs.
        let candles: Vec<Candle> = (0..60)
            .map(|i| {
                let close = 100.0 + i as f64;
                let open = close - 1.0;
                Candle {
                    time: i as i64 * 60_000,
                    open,
                    high: close + 0.5,
                    low: open - 0.5,
                    close,
                    volume: 1000.0,
                }
            })
            .collect();
        let indicators = calculate_all_indicators(&candles).unwrap();
        let gates = validate_gates(&candles, &indicators);
        assert!(gates.trend_stack);
        assert!(gates.bos_direction);
        assert!(!gates.fifty_percent_retest);
        assert!(!gates.volume_spike);
    }
}
