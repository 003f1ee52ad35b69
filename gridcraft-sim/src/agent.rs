//! The foraging agent: position, hunger, and the movement rules

use crate::direction::Direction;
use crate::error::{self, Result};
use crate::tile::Position;
use crate::world::{GridWorld, Region};
use serde::{Deserialize, Serialize};

/// Hunger an agent starts with and is restored to after eating
pub const DEFAULT_MAX_HUNGER: u32 = 10;

/// Window radius of [`Agent::vision`] (a 5x5 view)
pub const VISION_RANGE: u32 = 2;

/// What a single move attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub moved: bool,
    pub ate: bool,
}

impl MoveOutcome {
    pub const BLOCKED: MoveOutcome = MoveOutcome {
        moved: false,
        ate: false,
    };
}

/// An agent living on a [`GridWorld`].
///
/// The agent does not own the world; the world is borrowed for each move.
/// Hunger counts down by one per move attempt and death at zero is permanent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    position: Position,
    hunger: u32,
    max_hunger: u32,
    alive: bool,
}

impl Agent {
    /// A fresh agent with full hunger
    pub fn new(position: Position, max_hunger: u32) -> Self {
        Self::with_hunger(position, max_hunger, max_hunger)
    }

    /// An agent with a specific starting hunger, clamped to `max_hunger`
    pub fn with_hunger(position: Position, max_hunger: u32, hunger: u32) -> Self {
        let hunger = hunger.min(max_hunger);
        Self {
            position,
            hunger,
            max_hunger,
            alive: hunger > 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn hunger(&self) -> u32 {
        self.hunger
    }

    pub fn max_hunger(&self) -> u32 {
        self.max_hunger
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Eat the food under the agent, if any
    pub fn attempt_eat(&mut self, world: &mut GridWorld) -> bool {
        if world.consume_food(self.position) {
            self.hunger = self.max_hunger;
            true
        } else {
            false
        }
    }

    /// Try to step one cell in `direction`.
    ///
    /// Hunger is paid before anything else, even when the move is blocked.
    /// Death is checked last, after eating: a move that reaches food on the
    /// final hunger point refills hunger and the agent lives. Any other move
    /// from hunger 1 leaves it at 0 and dead.
    /// Blocked moves are an ordinary outcome; only moving a dead agent is an
    /// error.
    pub fn step(&mut self, world: &mut GridWorld, direction: Direction) -> Result<MoveOutcome> {
        if !self.alive {
            return Err(error::agent_deceased(self.position).with_operation("agent::step"));
        }

        self.hunger = self.hunger.saturating_sub(1);

        let target = direction.apply(self.position);
        let outcome = if world.is_walkable(target.x, target.y) {
            self.position = target;
            let ate = self.attempt_eat(world);
            MoveOutcome { moved: true, ate }
        } else {
            MoveOutcome::BLOCKED
        };

        if self.hunger == 0 {
            self.alive = false;
        }

        Ok(outcome)
    }

    /// The square window the agent would see with bounded vision
    pub fn vision_region(&self, range: u32) -> Region {
        Region::around(self.position, range)
    }

    /// Render the 5x5 neighbourhood of the agent
    pub fn vision(&self, world: &GridWorld) -> String {
        world.render(self.vision_region(VISION_RANGE), Some(self.position))
    }
}
