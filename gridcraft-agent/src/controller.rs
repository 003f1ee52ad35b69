//! Turn controller - orchestrates the simulation <-> oracle loop
//!
//! One round: build the prompt from the board and the last feedback, consult
//! the oracle, parse a direction, apply the move, emit feedback. Rounds are
//! strictly sequential because each prompt depends on the previous feedback
//! and continuation token.

use crate::feedback::TurnFeedback;
use crate::oracle::{ContinuationToken, Oracle, OracleReply};
use crate::prompt::{PromptBuilder, Visibility};
use gridcraft_sim::{
    parse_reply, Direction, Error, ErrorKind, MoveOutcome, OracleMove, Result, Simulation, Usage,
    UsageTracker,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound for [`ControllerConfig::max_retries`]
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Configuration for the turn loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Maximum number of rounds in a run
    pub max_steps: usize,
    pub visibility: Visibility,
    /// Include `hunger: h / max` in prompts
    pub show_hunger: bool,
    /// Deadline for a single oracle call
    pub oracle_timeout_secs: u64,
    /// Extra attempts per round for retryable failures
    pub max_retries: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            visibility: Visibility::Full,
            show_hunger: false,
            oracle_timeout_secs: 120,
            max_retries: 2,
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(Error::config_invalid("step limit must be positive"));
        }
        if self.oracle_timeout_secs == 0 {
            return Err(Error::config_invalid("oracle timeout must be positive"));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(Error::config_invalid(format!(
                "at most {} retries per round, got {}",
                MAX_RETRIES_LIMIT, self.max_retries
            )));
        }
        Ok(())
    }
}

/// Where the controller is in the round protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    AwaitingFirstPrompt,
    AwaitingOracleResponse,
    Applying,
    AgentDead,
    StepLimitReached,
    /// A round failed for good or the run was interrupted
    Aborted,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    StepLimit,
    AgentDied,
    /// A round failed after its retries
    Failed,
    Interrupted,
}

/// Everything that happened in one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub step: usize,
    pub prompt: String,
    pub response: String,
    pub direction: Direction,
    pub estimated_moves: Option<u32>,
    pub outcome: MoveOutcome,
    /// Hunger after the move
    pub hunger: u32,
    /// Oracle calls this round took, including retries
    pub attempts: u32,
    pub usage: Option<Usage>,
    pub feedback: TurnFeedback,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub oracle: String,
    pub termination: Termination,
    pub steps: usize,
    pub food_eaten: usize,
    pub final_hunger: u32,
    pub alive: bool,
    pub final_board: String,
    /// Why the run stopped early, for `Failed` and `Interrupted`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Token usage per model, when the oracle is metered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageTracker>,
    pub turns: Vec<TurnRecord>,
}

impl RunReport {
    /// Pretty JSON transcript of the run
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::new(ErrorKind::SerializationFailed, e.to_string())
                .with_operation("report::to_json")
                .set_source(e)
        })
    }

    /// Write the transcript to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| Error::file("report::save", path, e))
    }
}

/// A run that stopped on an error, with everything played up to that point
#[derive(Debug)]
pub struct RunAborted {
    pub report: Box<RunReport>,
    pub error: Error,
}

impl fmt::Display for RunAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run aborted after {} turns", self.report.steps)
    }
}

impl std::error::Error for RunAborted {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Drives decision rounds against an [`Oracle`]
pub struct TurnController<O> {
    oracle: O,
    config: ControllerConfig,
    prompts: PromptBuilder,
    state: TurnState,
    steps_taken: usize,
    /// Turns of the current run
    history: Vec<TurnRecord>,
}

impl<O: Oracle> TurnController<O> {
    pub fn new(oracle: O, config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            prompts: PromptBuilder::new(config.visibility, config.show_hunger),
            oracle,
            config,
            state: TurnState::AwaitingFirstPrompt,
            steps_taken: 0,
            history: Vec::new(),
        })
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }

    /// Play one round.
    ///
    /// `feedback` is the previous round's output, `None` on the first round.
    /// Blocked moves come back as ordinary feedback; a dead agent, an
    /// unparsable reply after retries, or an oracle failure is an error.
    pub async fn play_turn(
        &mut self,
        sim: &mut Simulation,
        feedback: Option<&TurnFeedback>,
    ) -> Result<TurnRecord> {
        if !sim.agent().is_alive() {
            self.state = TurnState::AgentDead;
            let pos = sim.agent().position();
            return Err(Error::agent_deceased(pos.x, pos.y).with_operation("controller::play_turn"));
        }

        let step = self.steps_taken + 1;
        let prompt = self.prompts.build(sim, feedback);
        debug!(step, "prompt:\n{}", prompt);

        self.state = TurnState::AwaitingOracleResponse;
        let continuation = feedback.and_then(|fb| fb.continuation.as_ref());
        let (reply, parsed, attempts) = self.decide(&prompt, continuation, step).await?;

        self.state = TurnState::Applying;
        let outcome = sim.step(parsed.direction)?;
        self.steps_taken = step;

        let hunger = sim.agent().hunger();
        info!(
            step,
            direction = %parsed.direction,
            moved = outcome.moved,
            ate = outcome.ate,
            hunger,
            estimate = ?parsed.estimated_moves,
            "turn applied"
        );

        self.state = if sim.agent().is_alive() {
            TurnState::AwaitingOracleResponse
        } else {
            TurnState::AgentDead
        };

        Ok(TurnRecord {
            step,
            prompt,
            response: reply.text,
            direction: parsed.direction,
            estimated_moves: parsed.estimated_moves,
            outcome,
            hunger,
            attempts,
            usage: reply.usage,
            feedback: TurnFeedback::from_outcome(parsed.direction, outcome, reply.token),
        })
    }

    /// Consult the oracle until it names a direction or retries run out
    async fn decide(
        &mut self,
        prompt: &str,
        continuation: Option<&ContinuationToken>,
        step: usize,
    ) -> Result<(OracleReply, OracleMove, u32)> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let result = match self.consult(prompt, continuation).await {
                Ok(reply) => parse_reply(&reply.text).map(|parsed| (reply, parsed)),
                Err(e) => Err(e),
            };

            match result {
                Ok((reply, parsed)) => {
                    debug!(step, "reply: {}", reply.text);
                    return Ok((reply, parsed, attempts));
                }
                Err(e) if e.is_retryable() && attempts <= self.config.max_retries => {
                    warn!(step, attempt = attempts, "round failed, retrying: {}", e);
                }
                Err(e) => {
                    let e = e
                        .with_operation("controller::decide")
                        .with_context("step", step.to_string())
                        .with_context("attempts", attempts.to_string());
                    return Err(if e.is_retryable() { e.persist() } else { e });
                }
            }
        }
    }

    async fn consult(
        &mut self,
        prompt: &str,
        continuation: Option<&ContinuationToken>,
    ) -> Result<OracleReply> {
        let secs = self.config.oracle_timeout_secs;
        match tokio::time::timeout(
            Duration::from_secs(secs),
            self.oracle.consult(prompt, continuation),
        )
        .await
        {
            Ok(reply) => reply,
            Err(_) => Err(Error::oracle_timeout(secs).with_operation("controller::consult")),
        }
    }

    /// Play rounds until the agent dies or the step limit is reached
    pub async fn run(&mut self, sim: &mut Simulation) -> std::result::Result<RunReport, RunAborted> {
        self.run_with(sim, |_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_turn` after every applied move.
    ///
    /// A round that fails for good ends the run; the turns played so far
    /// come back inside [`RunAborted`].
    pub async fn run_with<F>(
        &mut self,
        sim: &mut Simulation,
        mut on_turn: F,
    ) -> std::result::Result<RunReport, RunAborted>
    where
        F: FnMut(&TurnRecord, &Simulation),
    {
        self.history.clear();

        while self.history.len() < self.config.max_steps && sim.agent().is_alive() {
            let feedback = self.history.last().map(|t| t.feedback.clone());
            match self.play_turn(sim, feedback.as_ref()).await {
                Ok(record) => {
                    on_turn(&record, sim);
                    self.history.push(record);
                }
                Err(error) => {
                    warn!(step = self.history.len() + 1, "run failed: {}", error);
                    return Err(self.abort(sim, Termination::Failed, error));
                }
            }
        }

        let termination = if sim.agent().is_alive() {
            self.state = TurnState::StepLimitReached;
            Termination::StepLimit
        } else {
            self.state = TurnState::AgentDead;
            Termination::AgentDied
        };
        info!(steps = self.history.len(), ?termination, "run finished");

        Ok(self.report(sim, termination, None))
    }

    /// Stop the current run from outside, keeping the turns played so far.
    ///
    /// Meant for a caller that dropped a pending [`run_with`](Self::run_with)
    /// future, e.g. on Ctrl-C.
    pub fn interrupt(&mut self, sim: &Simulation) -> RunAborted {
        info!(steps = self.history.len(), "run interrupted");
        self.abort(sim, Termination::Interrupted, Error::interrupted())
    }

    fn abort(&mut self, sim: &Simulation, termination: Termination, error: Error) -> RunAborted {
        self.state = TurnState::Aborted;
        let report = self.report(sim, termination, Some(error.to_string()));
        RunAborted {
            report: Box::new(report),
            error,
        }
    }

    fn report(
        &mut self,
        sim: &Simulation,
        termination: Termination,
        error: Option<String>,
    ) -> RunReport {
        let turns = std::mem::take(&mut self.history);
        RunReport {
            oracle: self.oracle.name().to_string(),
            termination,
            steps: turns.len(),
            food_eaten: turns.iter().filter(|t| t.outcome.ate).count(),
            final_hunger: sim.agent().hunger(),
            alive: sim.agent().is_alive(),
            final_board: sim.render(),
            error,
            usage: self.oracle.usage().cloned(),
            turns,
        }
    }
}
