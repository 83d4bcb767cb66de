//! TOML configuration for the scalper session.
//!
//! Every section and field has a default, so an empty file is valid:
//!
//! ```toml
//! [market]
//! symbol = "SOLUSDT"
//! timeframe = "5m"
//! limit = 200
//! auto_calculation = true
//!
//! [risk]
//! account_size = 10000.0
//! risk_percent = 1.0
//!
//! [provider]
//! base_url = "https://api.bybit.com/v5/market/kline"
//! category = "linear"
//! max_retries = 2
//! timeout_secs = 30
//! ```

use std::path::Path;

use scalper_core::data::{BybitConfig, MIN_FETCH_CANDLES};
use scalper_core::state::{DEFAULT_SYMBOL, DEFAULT_TIMEFRAME};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalperConfig {
    pub market: MarketConfig,
    pub risk: RiskConfig,
    pub provider: BybitConfig,
}

/// Instrument and fetch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub symbol: String,
    pub timeframe: String,
    /// Candles requested per fetch.
    pub limit: usize,
    /// Whether `watch` keeps refreshing.
    pub auto_calculation: bool,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            timeframe: DEFAULT_TIMEFRAME.to_string(),
            limit: 200,
            auto_calculation: true,
        }
    }
}

/// Account settings for position sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub account_size: f64,
    pub risk_percent: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            account_size: 10_000.0,
            risk_percent: 1.0,
        }
    }
}

impl ScalperConfig {
    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.market.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("market.symbol must not be empty".into()));
        }
        if self.market.limit < MIN_FETCH_CANDLES {
            return Err(ConfigError::Invalid(format!(
                "market.limit must be >= {MIN_FETCH_CANDLES}, got {}",
                self.market.limit
            )));
        }
        if !(self.risk.account_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "risk.account_size must be > 0, got {}",
                self.risk.account_size
            )));
        }
        if !(self.risk.risk_percent > 0.0 && self.risk.risk_percent <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "risk.risk_percent must be in (0, 100], got {}",
                self.risk.risk_percent
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = ScalperConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScalperConfig::default());
        assert_eq!(config.market.symbol, "SOLUSDT");
        assert_eq!(config.market.limit, 200);
        assert_eq!(config.provider.category, "linear");
        assert_eq!(config.provider.max_retries, 2);
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = ScalperConfig::from_toml_str(
            r#"
            [market]
            symbol = "BTCUSDT"

            [risk]
            risk_percent = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.market.symbol, "BTCUSDT");
        assert_eq!(config.market.timeframe, "5m");
        assert_eq!(config.risk.risk_percent, 0.5);
        assert_eq!(config.risk.account_size, 10_000.0);
    }

    #[test]
    fn rejects_invalid_values() {
        for text in [
            "[market]\nlimit = 49",
            "[market]\nsymbol = \"\"",
            "[risk]\naccount_size = 0.0",
            "[risk]\nrisk_percent = 101.0",
            "[risk]\nrisk_percent = 0.0",
        ] {
            assert!(
                matches!(ScalperConfig::from_toml_str(text), Err(ConfigError::Invalid(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn parse_error_surfaces() {
        assert!(matches!(
            ScalperConfig::from_toml_str("[market\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scalper.toml");
        std::fs::write(&path, "[market]\ntimeframe = \"1m\"\n").unwrap();
        assert_eq!(ScalperConfig::load(&path).unwrap().market.timeframe, "1m");
        assert!(matches!(
            ScalperConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
