//! Gate vector → signal state.
//!
//! Evaluated fresh on every run. There is no memory of the previous state.

use serde::{Deserialize, Serialize};

use crate::domain::{ExecutionParams, Gates, SignalState};

/// Map the gate vector to a state: all four → `Entry`, none → `NoTrade`, else `Setup`.
pub fn classify(gates: &Gates) -> SignalState {
    match gates.passed_count() {
        4 => SignalState::Entry,
        0 => SignalState::NoTrade,
        _ => SignalState::Setup,
    }
}

/// Signal state and the execution parameters that accompany it.
///
/// Applied to the state holder as a single update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalDecision {
    pub state: SignalState,
    pub execution: Option<ExecutionParams>,
}

impl SignalDecision {
    pub fn new(gates: &Gates, execution: Option<ExecutionParams>) -> Self {
        Self {
            state: classify(gates),
            execution,
        }
    }

    /// The decision for a run that produced no indicators.
    pub fn inert() -> Self {
        Self {
            state: SignalState::NoTrade,
            execution: None,
        }
    }
}
