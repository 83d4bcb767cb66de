//! Bybit v5 kline provider.
//!
//! Fetches candles from the public market kline endpoint. Transport and HTTP
//! failures are retried with exponential backoff; an error payload or an
//! unusable body is returned immediately.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::provider::{finish_candles, without_void, CandleSource, DataError};
use crate::domain::Candle;

pub const DEFAULT_BASE_URL: &str = "https://api.bybit.com/v5/market/kline";
/// Interval used for timeframes Bybit does not know by name.
pub const DEFAULT_INTERVAL: &str = "5";

/// Bybit interval code for a timeframe label.
pub fn bybit_interval(timeframe: &str) -> Option<&'static str> {
    match timeframe {
        "1m" => Some("1"),
        "3m" => Some("3"),
        "5m" => Some("5"),
        "15m" => Some("15"),
        "1h" => Some("60"),
        _ => None,
    }
}

/// Connection settings for [`BybitProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BybitConfig {
    pub base_url: String,
    pub category: String,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            category: "linear".to_string(),
            max_retries: 2,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KlineResponse {
    ret_code: i64,
    #[serde(default)]
    ret_msg: Option<String>,
    #[serde(default)]
    result: Option<KlineResult>,
}

#[derive(Debug, Deserialize)]
struct KlineResult {
    #[serde(default)]
    list: Option<Vec<Vec<Value>>>,
}

/// Numeric value of a kline field. Bybit sends numbers as strings.
fn parse_field(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Row `[start, open, high, low, close, volume, turnover]`; `None` if any of
/// the first six fields is missing or not a number.
fn parse_row(row: &[Value]) -> Option<Candle> {
    let mut fields = [0.0; 6];
    for (slot, value) in fields.iter_mut().zip(row.get(..6)?) {
        *slot = parse_field(value)?;
    }
    let [time, open, high, low, close, volume] = fields;
    Some(Candle {
        time: time as i64,
        open,
        high,
        low,
        close,
        volume,
    })
}

/// Parse a kline response body into ascending candles.
pub fn parse_kline_body(body: &str) -> Result<Vec<Candle>, DataError> {
    let resp: KlineResponse = serde_json::from_str(body)
        .map_err(|e| DataError::InvalidResponse(format!("failed to parse kline body: {e}")))?;

    if resp.ret_code != 0 {
        let msg = resp
            .ret_msg
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(DataError::Upstream(format!("Bybit API Error: {msg}")));
    }

    let rows = resp
        .result
        .and_then(|r| r.list)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| DataError::Upstream("Invalid or empty data from Bybit API".into()))?;

    let total = rows.len();
    let candles = without_void(rows.iter().filter_map(|row| parse_row(row)).collect());
    if candles.len() < total {
        debug!(dropped = total - candles.len(), "dropped unparsable kline rows");
    }

    finish_candles(candles)
}

/// Bybit REST candle source.
pub struct BybitProvider {
    client: reqwest::blocking::Client,
    config: BybitConfig,
    base_delay: Duration,
}

impl BybitProvider {
    pub fn new(config: BybitConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            base_delay: Duration::from_millis(500),
        })
    }

    fn kline_url(&self, symbol: &str, timeframe: &str, limit: usize) -> String {
        let interval = bybit_interval(timeframe).unwrap_or_else(|| {
            warn!(timeframe, "unknown timeframe, using {DEFAULT_INTERVAL}m interval");
            DEFAULT_INTERVAL
        });
        format!(
            "{}?category={}&symbol={symbol}&interval={interval}&limit={limit}",
            self.config.base_url, self.config.category
        )
    }

    /// GET the kline body, retrying transport and HTTP status failures.
    fn get_with_retry(&self, url: &str) -> Result<String, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(attempt, ?delay, "retrying kline request");
                std::thread::sleep(delay);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        last_error = Some(DataError::Network(format!("HTTP {status}")));
                        continue;
                    }
                    match resp.text() {
                        Ok(body) => return Ok(body),
                        Err(e) => {
                            last_error = Some(DataError::Network(e.to_string()));
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(DataError::Network(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Network("max retries exceeded".into())))
    }
}

impl CandleSource for BybitProvider {
    fn name(&self) -> &str {
        "bybit"
    }

    fn fetch(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let url = self.kline_url(symbol, timeframe, limit);
        debug!(%url, "fetching klines");
        let body = self.get_with_retry(&url)?;
        parse_kline_body(&body)
    }
}
