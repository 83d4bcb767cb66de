//! Rolling volume analysis.
//!
//! For every candle from `period-1` on: the mean volume of the trailing
//! `period` candles, the current/average ratio (+inf on a zero average), a
//! spike flag (ratio >= 1.5) and a wick-absorption flag
//! (max(upper wick, lower wick) > 0.5 × body).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Indicator, Series};
use crate::domain::Candle;

pub const SPIKE_RATIO: f64 = 1.5;
pub const ABSORPTION_WICK_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAnalysis {
    /// Current volume over the trailing average. `+inf` serializes as `null`.
    #[serde(serialize_with = "ratio_to_json", deserialize_with = "ratio_from_json")]
    pub ratio: f64,
    pub spike: bool,
    pub absorption: bool,
    pub avg_volume: f64,
}

pub(crate) fn ratio_to_json<S: Serializer>(ratio: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if ratio.is_finite() {
        serializer.serialize_some(ratio)
    } else {
        serializer.serialize_none()
    }
}

pub(crate) fn ratio_from_json<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

#[derive(Debug, Clone)]
pub struct VolumeProfile {
    period: usize,
    name: String,
}

impl VolumeProfile {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume period must be >= 1");
        Self {
            period,
            name: format!("volume_{period}"),
        }
    }
}

impl Indicator for VolumeProfile {
    type Output = VolumeAnalysis;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Series<VolumeAnalysis> {
        if candles.len() < self.period {
            return Series::trailing(Vec::new(), candles.len());
        }

        let values = (self.period - 1..candles.len())
            .map(|i| {
                let window = &candles[i + 1 - self.period..=i];
                let avg_volume =
                    window.iter().fold(0.0, |sum, c| sum + c.volume) / self.period as f64;
                analyze_candle(&candles[i], avg_volume)
            })
            .collect();

        Series::trailing(values, candles.len())
    }
}

fn analyze_candle(candle: &Candle, avg_volume: f64) -> VolumeAnalysis {
    let ratio = if avg_volume == 0.0 {
        f64::INFINITY
    } else {
        candle.volume / avg_volume
    };
    let max_wick = candle.upper_wick().max(candle.lower_wick());
    VolumeAnalysis {
        ratio,
        spike: ratio >= SPIKE_RATIO,
        absorption: max_wick > candle.body() * ABSORPTION_WICK_RATIO,
        avg_volume,
    }
}
