//! Per-turn feedback carried into the next round

use crate::oracle::ContinuationToken;
use gridcraft_sim::{Direction, MoveOutcome};
use serde::{Deserialize, Serialize};

/// Result of one move attempt, as seen by the next prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnFeedback {
    pub message: Option<String>,
    /// Whether the move was physically applied
    pub success: bool,
    pub continuation: Option<ContinuationToken>,
}

impl TurnFeedback {
    pub fn from_outcome(
        direction: Direction,
        outcome: MoveOutcome,
        continuation: ContinuationToken,
    ) -> Self {
        Self {
            message: Some(outcome_message(direction, outcome)),
            success: outcome.moved,
            continuation: Some(continuation),
        }
    }
}

/// One of three fixed messages, selected by `(moved, ate)`
pub fn outcome_message(direction: Direction, outcome: MoveOutcome) -> String {
    match (outcome.moved, outcome.ate) {
        (true, true) => format!("You have moved {} successfully, and ate food!", direction),
        (true, false) => format!("You have moved {} successfully!", direction),
        (false, _) => format!("You cannot move {}. There is a wall!", direction),
    }
}
