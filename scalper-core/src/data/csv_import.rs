//! Local candle files.
//!
//! CSV files carry the header `time,open,high,low,close,volume`; JSON files
//! hold an array of candle objects with the same fields.

use std::fs::File;
use std::path::{Path, PathBuf};

use super::provider::{finish_candles, without_void, CandleSource, DataError};
use crate::domain::Candle;

fn read_csv(path: &Path) -> Result<Vec<Candle>, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let candles = reader
        .deserialize::<Candle>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(candles)
}

/// Load every candle from a CSV or `.json` file, ascending by time.
///
/// Rows with a NaN field are dropped. No minimum count applies; a short file
/// simply yields an inert pipeline.
pub fn load_candles_file(path: &Path) -> Result<Vec<Candle>, DataError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let candles: Vec<Candle> = if is_json {
        serde_json::from_reader(File::open(path)?)?
    } else {
        read_csv(path)?
    };
    Ok(without_void(candles))
}

/// Candle source backed by `{dir}/{SYMBOL}_{timeframe}.csv` files.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{timeframe}.csv", symbol.to_uppercase()))
    }
}

impl CandleSource for CsvDirectorySource {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let mut candles = without_void(read_csv(&self.path_for(symbol, timeframe))?);
        let skip = candles.len().saturating_sub(limit);
        finish_candles(candles.split_off(skip))
    }
}
