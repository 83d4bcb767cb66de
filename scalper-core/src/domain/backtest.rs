//! Backtest result types shared by the simulators and the application state.

use serde::{Deserialize, Serialize};

use super::signal::Direction;
use crate::indicators::volume::{ratio_from_json, ratio_to_json};

/// A forward-walk sample with its realized R-multiple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampledSetup {
    pub entry: f64,
    pub stop: f64,
    pub tp: f64,
    pub r: f64,
}

/// A bar where all four gates passed during a historical scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSetup {
    pub time: i64,
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub atr: f64,
    #[serde(serialize_with = "ratio_to_json", deserialize_with = "ratio_from_json")]
    pub volume_ratio: f64,
    pub ema8: f64,
    pub ema21: f64,
    pub ema50: f64,
}

/// One entry of a results collection. The two routines produce different shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Setup {
    Historical(HistoricalSetup),
    Sampled(SampledSetup),
}

impl Setup {
    pub fn entry(&self) -> f64 {
        match self {
            Setup::Historical(s) => s.entry,
            Setup::Sampled(s) => s.entry,
        }
    }

    pub fn stop(&self) -> f64 {
        match self {
            Setup::Historical(s) => s.stop,
            Setup::Sampled(s) => s.stop,
        }
    }

    /// Realized R-multiple. Only forward-walk samples carry one.
    pub fn r(&self) -> Option<f64> {
        match self {
            Setup::Sampled(s) => Some(s.r),
            Setup::Historical(_) => None,
        }
    }
}

/// Results of one backtest run. Replaced wholesale on every run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResults {
    pub setups: Vec<Setup>,
    pub expectancy: f64,
    pub hit_rate: f64,
    pub avg_r: f64,
    #[serde(rename = "maxDD")]
    pub max_dd: f64,
    pub rule_adherence: f64,
    pub variance_r: f64,
}

impl BacktestResults {
    /// Results carrying only setups, every statistic at zero.
    pub fn from_setups(setups: Vec<Setup>) -> Self {
        Self {
            setups,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.setups.is_empty()
    }
}
