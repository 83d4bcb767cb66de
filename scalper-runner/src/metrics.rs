//! Backtest statistics — pure functions over a list of R-multiples.
//!
//! Every statistic is a pure function: R-multiples in, scalar out.
//! An empty list yields zero everywhere.

use scalper_core::domain::{BacktestResults, Setup};

/// Rule-adherence score with no wins.
const RULE_ADHERENCE_BASE: f64 = 80.0;
const RULE_ADHERENCE_CAP: usize = 20;

/// Aggregate statistics for one set of R-multiples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BacktestStats {
    pub expectancy: f64,
    pub hit_rate: f64,
    pub avg_r: f64,
    pub max_dd: f64,
    pub rule_adherence: f64,
    pub variance_r: f64,
}

impl BacktestStats {
    pub fn compute(rs: &[f64]) -> Self {
        if rs.is_empty() {
            return Self::default();
        }
        let avg_r = mean(rs);
        Self {
            expectancy: avg_r,
            hit_rate: hit_rate(rs),
            avg_r,
            max_dd: max_drawdown(rs),
            rule_adherence: rule_adherence(wins(rs)),
            variance_r: variance(rs),
        }
    }

    /// Results carrying `setups` and these statistics.
    pub fn into_results(self, setups: Vec<Setup>) -> BacktestResults {
        BacktestResults {
            setups,
            expectancy: self.expectancy,
            hit_rate: self.hit_rate,
            avg_r: self.avg_r,
            max_dd: self.max_dd,
            rule_adherence: self.rule_adherence,
            variance_r: self.variance_r,
        }
    }
}

/// Recompute statistics from whatever R-multiples a results set carries.
///
/// Setups without an R-multiple (historical scan) are ignored.
pub fn restate(results: &BacktestResults) -> BacktestStats {
    let rs: Vec<f64> = results.setups.iter().filter_map(Setup::r).collect();
    BacktestStats::compute(&rs)
}

// ─── Individual statistics ──────────────────────────────────────────

/// Count of strictly positive R-multiples.
pub fn wins(rs: &[f64]) -> usize {
    rs.iter().filter(|r| **r > 0.0).count()
}

/// Percentage of winning setups.
pub fn hit_rate(rs: &[f64]) -> f64 {
    if rs.is_empty() {
        return 0.0;
    }
    wins(rs) as f64 / rs.len() as f64 * 100.0
}

pub fn mean(rs: &[f64]) -> f64 {
    if rs.is_empty() {
        return 0.0;
    }
    rs.iter().fold(0.0, |sum, r| sum + r) / rs.len() as f64
}

/// Population variance.
pub fn variance(rs: &[f64]) -> f64 {
    if rs.is_empty() {
        return 0.0;
    }
    let m = mean(rs);
    rs.iter().fold(0.0, |sum, r| sum + (r - m).powi(2)) / rs.len() as f64
}

/// Cumulative R equity curve, starting at 0.
pub fn equity_curve(rs: &[f64]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(rs.len() + 1);
    let mut equity = 0.0;
    curve.push(equity);
    for r in rs {
        equity += r;
        curve.push(equity);
    }
    curve
}

/// Lowest point of the equity curve, in percent of one R, sign-flipped.
///
/// A curve that never drops below its start reports a positive zero.
pub fn max_drawdown(rs: &[f64]) -> f64 {
    let lowest = equity_curve(rs)
        .into_iter()
        .fold(f64::INFINITY, f64::min);
    // `0.0 * -100.0` is `-0.0`, which serializes with its sign.
    lowest * -100.0 + 0.0
}

/// Placeholder score: 80 plus one point per win, capped at 100.
pub fn rule_adherence(wins: usize) -> f64 {
    RULE_ADHERENCE_BASE + wins.min(RULE_ADHERENCE_CAP) as f64
}
