//! Candle sources: the fetch contract plus Bybit REST and local-file implementations.

pub mod bybit;
pub mod csv_import;
pub mod provider;

pub use bybit::{bybit_interval, parse_kline_body, BybitConfig, BybitProvider};
pub use csv_import::{load_candles_file, CsvDirectorySource};
pub use provider::{CandleSource, DataError, MIN_FETCH_CANDLES};
