//! Shared types for the two backtest routines.

use std::fmt;

use thiserror::Error;

/// Which backtest routine raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routine {
    ForwardWalk,
    HistoricalScan,
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Routine::ForwardWalk => write!(f, "mini backtest"),
            Routine::HistoricalScan => write!(f, "historical scan"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BacktestError {
    #[error("Not enough data (need >={required} candles) for {routine}, got {actual}.")]
    InsufficientHistory {
        routine: Routine,
        required: usize,
        actual: usize,
    },
}

/// Fail with `InsufficientHistory` when fewer than `required` candles exist.
pub(crate) fn require_history(
    routine: Routine,
    required: usize,
    actual: usize,
) -> Result<(), BacktestError> {
    if actual < required {
        return Err(BacktestError::InsufficientHistory {
            routine,
            required,
            actual,
        });
    }
    Ok(())
}
