//! Prompt construction for one decision round

use crate::feedback::TurnFeedback;
use gridcraft_sim::Simulation;
use serde::{Deserialize, Serialize};

/// Separator between prompt sections
pub const SECTION_BREAK: &str = "\n---\n\n";

/// Closing instruction, present in every prompt
pub const MOVE_INSTRUCTION: &str = "Enter a command where you want to move:";

/// How much of the world the oracle is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Visibility {
    /// The whole board every turn
    Full,
    /// A square window `range` cells around the agent
    Window { range: u32 },
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Full
    }
}

/// Builds the prompt text from the simulation and the last feedback
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    visibility: Visibility,
    show_hunger: bool,
}

impl PromptBuilder {
    pub fn new(visibility: Visibility, show_hunger: bool) -> Self {
        Self {
            visibility,
            show_hunger,
        }
    }

    /// The board as the oracle should see it
    pub fn view(&self, sim: &Simulation) -> String {
        match self.visibility {
            Visibility::Full => sim.render(),
            Visibility::Window { range } => sim.render_vision(range),
        }
    }

    /// Assemble the prompt.
    ///
    /// Layout: the previous feedback message (if any), then the current state
    /// when the last move was applied or on the first round, then the move
    /// instruction. After a blocked move the board is unchanged and omitted.
    pub fn build(&self, sim: &Simulation, feedback: Option<&TurnFeedback>) -> String {
        let mut prompt = String::new();

        if let Some(message) = feedback.and_then(|fb| fb.message.as_deref()) {
            prompt.push_str(message);
            prompt.push_str("\n\n---\n\n");
        }

        if self.show_hunger {
            let agent = sim.agent();
            prompt.push_str(&format!("hunger: {} / {}\n\n", agent.hunger(), agent.max_hunger()));
        }

        if feedback.map_or(true, |fb| fb.success) {
            prompt.push_str("CURRENT STATE:\n");
            prompt.push_str(&format!("vision:\n{}\n", self.view(sim)));
            prompt.push_str(SECTION_BREAK);
        }

        prompt.push_str(MOVE_INSTRUCTION);
        prompt
    }
}
