//! One explicit pipeline invocation: candles → indicators → gates → decision.
//!
//! The host calls [`run_pipeline`] on each new data arrival or timer tick and
//! applies the output to its state holder. Nothing here touches shared state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Candle, Gates};
use crate::execution_params::calculate_execution_params;
use crate::gates::validate_gates;
use crate::indicators::{calculate_all_indicators, IndicatorError, IndicatorSet};
use crate::signal::SignalDecision;

/// Everything a single run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    pub indicators: IndicatorSet,
    pub gates: Gates,
    /// `None` when indicator calculation failed and the run stopped early.
    pub decision: Option<SignalDecision>,
}

impl PipelineOutput {
    /// Output for a run with too little data: empty indicators, all gates false.
    pub fn inert() -> Self {
        Self {
            indicators: IndicatorSet::default(),
            gates: Gates::default(),
            decision: None,
        }
    }

    pub fn is_inert(&self) -> bool {
        self.decision.is_none()
    }
}

/// Run the full live pipeline on `candles`.
///
/// Insufficient data is recovered here: the output is inert and no error
/// reaches the caller.
pub fn run_pipeline(candles: &[Candle]) -> PipelineOutput {
    let indicators = match calculate_all_indicators(candles) {
        Ok(set) => set,
        Err(IndicatorError::InsufficientData { required, actual }) => {
            debug!(required, actual, "pipeline inert: insufficient candles");
            return PipelineOutput::inert();
        }
    };

    let gates = validate_gates(candles, &indicators);
    let execution = calculate_execution_params(candles, &indicators);
    let decision = SignalDecision::new(&gates, execution);

    debug!(
        candles = candles.len(),
        passed = gates.passed_count(),
        state = decision.state.as_str(),
        "pipeline evaluated"
    );

    PipelineOutput {
        indicators,
        gates,
        decision: Some(decision),
    }
}
