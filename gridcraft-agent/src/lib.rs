//! # gridcraft Agent
//!
//! The turn loop between the grid simulation and an oracle:
//! 1. Render the board and the previous feedback into a prompt
//! 2. Ask the oracle where to go, continuing its conversation by token
//! 3. Parse the direction out of the reply (re-prompting if there is none)
//! 4. Apply the move and report what happened
//! 5. Repeat until the agent starves or the step limit is reached
//!
//! The oracle is the brain, the simulation is the body.

mod controller;
mod feedback;
mod oracle;
mod prompt;

pub use controller::{
    ControllerConfig, RunAborted, RunReport, Termination, TurnController, TurnRecord, TurnState,
    MAX_RETRIES_LIMIT,
};
pub use feedback::{outcome_message, TurnFeedback};
pub use oracle::{ChatOracle, ContinuationToken, Oracle, OracleReply, RandomOracle, SYSTEM_PROMPT};
pub use prompt::{PromptBuilder, Visibility, MOVE_INSTRUCTION};
