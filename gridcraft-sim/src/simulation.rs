//! Run parameters and the world + agent pair driven by the turn loop

use crate::agent::{Agent, MoveOutcome, DEFAULT_MAX_HUNGER};
use crate::direction::Direction;
use crate::error::{self, Error, Result};
use crate::tile::{Position, TileKind};
use crate::world::{GridWorld, Region, TileDistribution};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Parameters for building a [`Simulation`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: usize,
    pub height: usize,
    pub start: Position,
    pub max_hunger: u32,
    /// Seed for world generation; `None` draws from OS entropy
    pub seed: Option<u64>,
    pub distribution: TileDistribution,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            start: Position::new(5, 5),
            max_hunger: DEFAULT_MAX_HUNGER,
            seed: None,
            distribution: TileDistribution::default(),
        }
    }
}

impl SimConfig {
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_start(mut self, x: i64, y: i64) -> Self {
        self.start = Position::new(x, y);
        self
    }

    pub fn with_max_hunger(mut self, max_hunger: u32) -> Self {
        self.max_hunger = max_hunger;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Read a JSON config; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::file("config::load", path, e))?;
        serde_json::from_str(&text).map_err(|e| {
            error::config_invalid(format!("invalid config: {}", e))
                .with_operation("config::load")
                .with_context("path", path.display().to_string())
                .set_source(e)
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(error::config_invalid(format!(
                "world dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_hunger == 0 {
            return Err(error::config_invalid("max hunger must be positive"));
        }
        let in_bounds = (0..self.width as i64).contains(&self.start.x)
            && (0..self.height as i64).contains(&self.start.y);
        if !in_bounds {
            return Err(error::config_invalid(format!(
                "start {} is outside the {}x{} world",
                self.start, self.width, self.height
            ))
            .with_context("start", self.start.to_string()));
        }
        self.distribution.validate()
    }
}

/// One world and the single agent living in it
#[derive(Debug, Clone)]
pub struct Simulation {
    world: GridWorld,
    agent: Agent,
}

impl Simulation {
    /// Generate a world from `config`, seeded if a seed is configured
    pub fn from_config(config: &SimConfig) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::generate(config, &mut rng)
    }

    /// Generate a world with an injected random source.
    ///
    /// The start cell is cleared to floor so the agent never spawns inside
    /// an obstacle.
    pub fn generate<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let mut world =
            GridWorld::generated(config.width, config.height, config.distribution, rng)?;
        if world.tile(config.start) == TileKind::Obstacle {
            debug!(start = %config.start, "clearing obstacle under start position");
            world.set_tile(config.start, TileKind::Floor)?;
        }
        debug!(
            width = config.width,
            height = config.height,
            food = world.food_count(),
            "generated world"
        );
        Ok(Self {
            world,
            agent: Agent::new(config.start, config.max_hunger),
        })
    }

    /// Assemble from a prepared world and agent
    pub fn from_parts(world: GridWorld, agent: Agent) -> Result<Self> {
        let pos = agent.position();
        if world.is_outside(pos.x, pos.y) {
            return Err(error::out_of_bounds(pos, world.width(), world.height()));
        }
        if !world.is_walkable(pos.x, pos.y) {
            return Err(error::invalid_argument(format!("agent starts inside an obstacle at {}", pos)));
        }
        Ok(Self { world, agent })
    }

    /// Parse a rendered board; the `@` marker is the agent's start
    pub fn parse(text: &str, max_hunger: u32) -> Result<Self> {
        if max_hunger == 0 {
            return Err(error::config_invalid("max hunger must be positive"));
        }
        let (world, start) = GridWorld::parse(text)?;
        let start = start.ok_or_else(|| error::parse_failed("board has no '@' agent marker"))?;
        Self::from_parts(world, Agent::new(start, max_hunger))
    }

    /// Read a hand-drawn board from a file
    pub fn load(path: &Path, max_hunger: u32) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::file("world::load", path, e))?;
        Self::parse(&text, max_hunger)
            .map_err(|e| e.with_context("path", path.display().to_string()))
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Apply one move attempt
    pub fn step(&mut self, direction: Direction) -> Result<MoveOutcome> {
        self.agent.step(&mut self.world, direction)
    }

    /// The full board with the agent marked
    pub fn render(&self) -> String {
        self.world.render_full(Some(self.agent.position()))
    }

    pub fn render_region(&self, region: Region) -> String {
        self.world.render(region, Some(self.agent.position()))
    }

    /// The agent's bounded view, `range` cells in every direction
    pub fn render_vision(&self, range: u32) -> String {
        self.render_region(self.agent.vision_region(range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_config_validation() {
        assert!(SimConfig::default().validate().is_ok());

        let err = SimConfig::default().with_size(0, 4).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = SimConfig::default().with_start(10, 0).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        assert!(SimConfig::default().with_start(-1, 0).validate().is_err());
        assert!(SimConfig::default().with_max_hunger(0).validate().is_err());
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let config = SimConfig::default().with_seed(42);
        let a = Simulation::from_config(&config).unwrap();
        let b = Simulation::from_config(&config).unwrap();
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn test_start_cell_is_carved() {
        let mut config = SimConfig::default().with_size(3, 3).with_start(1, 1).with_seed(3);
        config.distribution = TileDistribution { obstacle: 1.0, food: 0.0 };
        let sim = Simulation::from_config(&config).unwrap();
        assert_eq!(sim.render(), "###\n#@#\n###");
        assert!(sim.world().is_walkable(1, 1));
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{"width": 4, "height": 3, "start": {"x": 0, "y": 0}}"#).unwrap();
        assert_eq!(config.width, 4);
        assert_eq!(config.max_hunger, DEFAULT_MAX_HUNGER);
        assert_eq!(config.distribution, TileDistribution::default());
    }

    #[test]
    fn test_parse_board() {
        let sim = Simulation::parse(".F.\n.@.\n...", 10).unwrap();
        assert_eq!(sim.agent().position(), Position::new(1, 1));
        assert_eq!(sim.render(), ".F.\n.@.\n...");

        assert!(Simulation::parse("...", 10).is_err());
        assert!(Simulation::parse("@..", 0).is_err());
    }

    #[test]
    fn test_load_config_and_board_files() {
        let dir = tempfile::tempdir().unwrap();

        let config_path = dir.path().join("run.json");
        std::fs::write(&config_path, r#"{"width": 6, "seed": 9}"#).unwrap();
        let config = SimConfig::load(&config_path).unwrap();
        assert_eq!(config.width, 6);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.height, 10);

        let board_path = dir.path().join("board.txt");
        std::fs::write(&board_path, ".F\n@.\n").unwrap();
        let sim = Simulation::load(&board_path, 4).unwrap();
        assert_eq!(sim.agent().position(), Position::new(0, 0));
        assert_eq!(sim.agent().max_hunger(), 4);
    }

    #[test]
    fn test_load_errors_carry_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");

        let err = Simulation::load(&missing, 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.operation(), "world::load");

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        let err = SimConfig::load(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.context().iter().any(|(k, _)| *k == "path"));
    }

    #[test]
    fn test_from_parts_rejects_bad_start() {
        let (world, _) = GridWorld::parse("#.").unwrap();
        assert!(Simulation::from_parts(world.clone(), Agent::new(Position::new(0, 0), 5)).is_err());
        assert!(Simulation::from_parts(world.clone(), Agent::new(Position::new(2, 0), 5)).is_err());
        assert!(Simulation::from_parts(world, Agent::new(Position::new(1, 0), 5)).is_ok());
    }

    #[test]
    fn test_step_and_render_vision() {
        let mut sim = Simulation::parse("F..\n@..", 10).unwrap();
        let outcome = sim.step(Direction::Up).unwrap();
        assert!(outcome.moved && outcome.ate);
        assert_eq!(sim.render(), "@..\n...");
        assert_eq!(sim.render_vision(1), "###\n#@.\n#..");
    }
}
