//! Execution parameters for the latest bar.
//!
//! Runs on every pipeline invocation regardless of gate state, so a live
//! hypothetical trade is always available. Direction follows EMA8 vs EMA21.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Direction, ExecutionParams};
use crate::indicators::IndicatorSet;

/// Entry placed this many ATRs beyond the close, in the trade direction.
pub const ENTRY_ATR_BUFFER: f64 = 0.1;
/// Stop placed this many ATRs behind the close.
pub const STOP_ATR_MULT: f64 = 1.0;
/// Trailing stop distance in ATRs.
pub const TRAILING_ATR_MULT: f64 = 0.5;
/// ATR stand-in as a fraction of price when no usable ATR exists.
pub const FALLBACK_ATR_PCT: f64 = 0.025;

/// Derive entry, stop, targets and trailing stop from the latest candle.
///
/// Returns `None` only when there are no candles; callers keep their previous
/// parameters in that case.
pub fn calculate_execution_params(
    candles: &[Candle],
    indicators: &IndicatorSet,
) -> Option<ExecutionParams> {
    let current_price = candles.last()?.close;

    // Missing, zero and NaN ATR all fall back to a percentage of price.
    let atr = indicators
        .atr14
        .last_value()
        .filter(|a| *a != 0.0 && !a.is_nan())
        .unwrap_or(current_price * FALLBACK_ATR_PCT);

    let direction = match (indicators.ema8.last_value(), indicators.ema21.last_value()) {
        (Some(e8), Some(e21)) if e8 > e21 => Direction::Long,
        _ => Direction::Short,
    };

    let (entry, stop_loss, tp1, tp2) = match direction {
        Direction::Long => {
            let entry = current_price + ENTRY_ATR_BUFFER * atr;
            let stop_loss = current_price - STOP_ATR_MULT * atr;
            let risk = entry - stop_loss;
            (entry, stop_loss, entry + 1.0 * risk, entry + 2.0 * risk)
        }
        Direction::Short => {
            let entry = current_price - ENTRY_ATR_BUFFER * atr;
            let stop_loss = current_price + STOP_ATR_MULT * atr;
            let risk = stop_loss - entry;
            (entry, stop_loss, entry - 1.0 * risk, entry - 2.0 * risk)
        }
    };

    Some(ExecutionParams {
        entry,
        stop_loss,
        tp1,
        tp2,
        trailing_stop: TRAILING_ATR_MULT * atr,
        risk_reward: risk_reward_label(entry, stop_loss, tp2),
        current_market_price: Some(current_price),
        direction: Some(direction),
        position_size: None,
        max_risk: None,
    })
}

/// `"1:R"` with R = |tp2 - entry| / |entry - stop| to one decimal, `"1:0.0"` on zero risk.
pub fn risk_reward_label(entry: f64, stop_loss: f64, tp2: f64) -> String {
    let risk = (entry - stop_loss).abs();
    let reward = (tp2 - entry).abs();
    let ratio = if risk > 0.0 { reward / risk } else { 0.0 };
    format!("1:{ratio:.1}")
}

/// Position size for a fixed fraction of the account at risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSizing {
    /// Units of the base asset.
    pub position_size: f64,
    /// Position value in quote currency.
    pub notional: f64,
    /// Quote currency lost if the stop is hit.
    pub max_risk: f64,
}

impl PositionSizing {
    /// Size so that a stop-out loses `risk_percent`% of `account_size`.
    ///
    /// An unset panel (entry or stop at zero) sizes to zero but still reports
    /// the risk budget.
    pub fn compute(params: &ExecutionParams, account_size: f64, risk_percent: f64) -> Self {
        let max_risk = account_size * (risk_percent / 100.0);

        if params.entry == 0.0 || params.stop_loss == 0.0 {
            return Self {
                position_size: 0.0,
                notional: 0.0,
                max_risk,
            };
        }

        let risk_per_unit = (params.entry - params.stop_loss).abs();
        let position_size = if risk_per_unit > 0.0 {
            max_risk / risk_per_unit
        } else {
            0.0
        };

        Self {
            position_size,
            notional: position_size * params.entry,
            max_risk,
        }
    }

    /// Copy of `params` carrying this sizing.
    pub fn apply(&self, params: &ExecutionParams) -> ExecutionParams {
        ExecutionParams {
            position_size: Some(self.position_size),
            max_risk: Some(self.max_risk),
            ..params.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, Series};

    fn indicators(e8: f64, e21: f64, atr: f64) -> IndicatorSet {
        IndicatorSet {
            ema8: Series::new(vec![e8], 0),
            ema21: Series::new(vec![e21], 0),
            atr14: Series::new(vec![atr], 0),
            ..IndicatorSet::default()
        }
    }

    #[test]
    fn long_params() {
        let candles = make_candles(&[100.0]);
        let p = calculate_execution_params(&candles, &indicators(101.0, 100.0, 2.0)).unwrap();
        assert_eq!(p.direction, Some(Direction::Long));
        assert_approx(p.entry, 100.2, 1e-12);
        assert_approx(p.stop_loss, 98.0, 1e-12);
        assert_approx(p.tp1, 102.4, 1e-12);
        assert_approx(p.tp2, 104.6, 1e-12);
        assert_approx(p.trailing_stop, 1.0, 1e-12);
        assert_eq!(p.risk_reward, "1:2.0");
        assert_eq!(p.current_market_price, Some(100.0));
    }

    #[test]
    fn short_params_mirror() {
        let candles = make_candles(&[100.0]);
        let p = calculate_execution_params(&candles, &indicators(99.0, 100.0, 2.0)).unwrap();
        assert_eq!(p.direction, Some(Direction::Short));
        assert_approx(p.entry, 99.8, 1e-12);
        assert_approx(p.stop_loss, 102.0, 1e-12);
        assert_approx(p.tp1, 97.6, 1e-12);
        assert_approx(p.tp2, 95.4, 1e-12);
        assert_approx(p.trailing_stop, 1.0, 1e-12);
    }

    #[test]
    fn equal_emas_are_short() {
        let candles = make_candles(&[100.0]);
        let p = calculate_execution_params(&candles, &indicators(100.0, 100.0, 2.0)).unwrap();
        assert_eq!(p.direction, Some(Direction::Short));
    }

    #[test]
    fn missing_or_zero_atr_falls_back_to_price_fraction() {
        let candles = make_candles(&[200.0]);
        let empty = calculate_execution_params(&candles, &IndicatorSet::default()).unwrap();
        assert_approx(empty.trailing_stop, 0.5 * 5.0, 1e-12);
        assert_eq!(empty.direction, Some(Direction::Short));

        let zero = calculate_execution_params(&candles, &indicators(1.0, 2.0, 0.0)).unwrap();
        assert_approx(zero.trailing_stop, 2.5, 1e-12);
    }

    #[test]
    fn no_candles_no_params() {
        assert!(calculate_execution_params(&[], &IndicatorSet::default()).is_none());
    }

    #[test]
    fn risk_reward_zero_risk() {
        assert_eq!(risk_reward_label(100.0, 100.0, 100.0), "1:0.0");
        assert_eq!(risk_reward_label(100.0, 99.0, 103.0), "1:3.0");
    }

    #[test]
    fn sizing_from_risk_budget() {
        let params = ExecutionParams {
            entry: 100.0,
            stop_loss: 98.0,
            ..ExecutionParams::default()
        };
        let sizing = PositionSizing::compute(&params, 10_000.0, 1.0);
        assert_approx(sizing.max_risk, 100.0, 1e-12);
        assert_approx(sizing.position_size, 50.0, 1e-12);
        assert_approx(sizing.notional, 5000.0, 1e-9);

        let applied = sizing.apply(&params);
        assert_eq!(applied.position_size, Some(sizing.position_size));
        assert_eq!(applied.max_risk, Some(100.0));
    }

    #[test]
    fn sizing_unset_panel() {
        let sizing = PositionSizing::compute(&ExecutionParams::default(), 10_000.0, 2.0);
        assert_eq!(sizing.position_size, 0.0);
        assert_approx(sizing.max_risk, 200.0, 1e-12);
    }
}
