//! Signal-side value objects: gate vector, engine state, execution parameters.

use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for long, -1.0 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

/// Four-gate qualification checklist, evaluated on the latest bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gates {
    pub trend_stack: bool,
    pub bos_direction: bool,
    pub fifty_percent_retest: bool,
    pub volume_spike: bool,
}

impl Gates {
    /// Gates in checklist order.
    pub fn as_array(&self) -> [bool; 4] {
        [
            self.trend_stack,
            self.bos_direction,
            self.fifty_percent_retest,
            self.volume_spike,
        ]
    }

    pub fn passed_count(&self) -> usize {
        self.as_array().iter().filter(|&&g| g).count()
    }

    /// Short labels of the passing gates, in checklist order.
    pub fn passed_labels(&self) -> Vec<&'static str> {
        const LABELS: [&str; 4] = ["EMA", "BOS", "50%", "Volume"];
        self.as_array()
            .iter()
            .zip(LABELS)
            .filter(|(passed, _)| **passed)
            .map(|(_, label)| label)
            .collect()
    }
}

/// Signal engine state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalState {
    #[default]
    NoTrade,
    Setup,
    Entry,
}

impl SignalState {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalState::NoTrade => "NO_TRADE",
            SignalState::Setup => "SETUP",
            SignalState::Entry => "ENTRY",
        }
    }
}

impl std::fmt::Display for SignalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hypothetical trade derived from the latest bar, independent of gate state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionParams {
    pub entry: f64,
    pub stop_loss: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub trailing_stop: f64,
    pub risk_reward: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_market_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_risk: Option<f64>,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            entry: 0.0,
            stop_loss: 0.0,
            tp1: 0.0,
            tp2: 0.0,
            trailing_stop: 0.0,
            risk_reward: "1:2".to_string(),
            current_market_price: None,
            direction: None,
            position_size: None,
            max_risk: None,
        }
    }
}

/// Trend classification from the EMA stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendTag {
    Bull,
    Bear,
    Neutral,
}

impl TrendTag {
    /// Classify from fast/mid/slow EMA values. Missing values are neutral.
    pub fn classify(e8: Option<f64>, e21: Option<f64>, e50: Option<f64>) -> Self {
        match (e8, e21, e50) {
            (Some(a), Some(b), Some(c)) if a > b && b > c => TrendTag::Bull,
            (Some(a), Some(b), Some(c)) if a < b && b < c => TrendTag::Bear,
            _ => TrendTag::Neutral,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrendTag::Bull => "BULL",
            TrendTag::Bear => "BEAR",
            TrendTag::Neutral => "NEUTRAL",
        }
    }
}
