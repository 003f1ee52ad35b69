//! # Grid World
//!
//! Tile storage, geometry queries, and the text rendering that is shown to
//! the oracle.
//!
//! ## Rendering format
//! - One row per `y`, from the top of the region (`max_y`) down to `min_y`
//! - One character per `x`, left to right
//! - `#` obstacle, `.` floor, `F` food, `@` agent
//! - Rows joined by `\n`, no trailing newline
//!
//! Cells outside the world render as `#`: the world is implicitly walled.

use crate::error::{self, Result};
use crate::tile::{Position, TileKind, AGENT_CHAR};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-cell probabilities used by world generation.
///
/// Each cell is an obstacle with probability `obstacle`; otherwise it is food
/// with probability `food`; otherwise floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileDistribution {
    pub obstacle: f64,
    pub food: f64,
}

impl Default for TileDistribution {
    fn default() -> Self {
        Self {
            obstacle: 0.15,
            food: 0.05,
        }
    }
}

impl TileDistribution {
    pub fn validate(&self) -> Result<()> {
        for (name, p) in [("obstacle", self.obstacle), ("food", self.food)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(error::config_invalid(format!(
                    "{} probability {} is outside [0, 1]",
                    name, p
                )));
            }
        }
        Ok(())
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TileKind {
        if rng.gen_bool(self.obstacle) {
            TileKind::Obstacle
        } else if rng.gen_bool(self.food) {
            TileKind::Food
        } else {
            TileKind::Floor
        }
    }
}

/// An inclusive rectangle of cell coordinates. May extend past the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl Region {
    pub const fn new(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Square window of `range` cells in every direction around `center`
    pub fn around(center: Position, range: u32) -> Self {
        let r = i64::from(range);
        Self::new(center.x - r, center.y - r, center.x + r, center.y + r)
    }

    pub fn contains(&self, pos: Position) -> bool {
        (self.min_x..=self.max_x).contains(&pos.x) && (self.min_y..=self.max_y).contains(&pos.y)
    }
}

/// The 2-D grid of tiles.
///
/// Dimensions are fixed at construction. The only mutation after generation
/// is food turning into floor when eaten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridWorld {
    width: usize,
    height: usize,
    /// Row-major, `y * width + x`
    tiles: Vec<TileKind>,
}

impl GridWorld {
    /// A world of the given size filled with floor
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::from_tiles(width, height, vec![TileKind::Floor; width.saturating_mul(height)])
    }

    /// A randomly generated world
    pub fn generated<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        distribution: TileDistribution,
        rng: &mut R,
    ) -> Result<Self> {
        let mut world = Self::new(width, height)?;
        world.generate(distribution, rng)?;
        Ok(world)
    }

    /// Build from explicit tiles in row-major order, bottom row (`y = 0`) first
    pub fn from_tiles(width: usize, height: usize, tiles: Vec<TileKind>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(error::config_invalid(format!(
                "world dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if tiles.len() != width * height {
            return Err(error::invalid_argument(format!(
                "expected {} tiles for a {}x{} world, got {}",
                width * height,
                width,
                height,
                tiles.len()
            )));
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    /// Parse the rendering format back into a world.
    ///
    /// The first line is the top row. An `@` marks the agent, standing on
    /// floor; its position is returned alongside the world.
    pub fn parse(text: &str) -> Result<(Self, Option<Position>)> {
        let rows: Vec<&str> = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty())
            .collect();

        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(error::parse_failed("world text is empty"));
        }

        let mut tiles = vec![TileKind::Floor; width * height];
        let mut agent = None;

        for (row_index, row) in rows.iter().enumerate() {
            let y = height - 1 - row_index;
            let len = row.chars().count();
            if len != width {
                return Err(error::parse_failed(format!(
                    "row {} has {} cells, expected {}",
                    row_index, len, width
                ))
                .with_context("row", row.to_string()));
            }

            for (x, c) in row.chars().enumerate() {
                let kind = if c == AGENT_CHAR {
                    if agent.is_some() {
                        return Err(error::parse_failed("more than one agent marker"));
                    }
                    agent = Some(Position::new(x as i64, y as i64));
                    TileKind::Floor
                } else {
                    TileKind::from_char(c).ok_or_else(|| {
                        error::parse_failed(format!("unknown tile character '{}'", c))
                            .with_context("position", format!("({}, {})", x, y))
                    })?
                };
                tiles[y * width + x] = kind;
            }
        }

        Ok((Self::from_tiles(width, height, tiles)?, agent))
    }

    /// Re-populate every cell independently. Previous contents are discarded.
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        distribution: TileDistribution,
        rng: &mut R,
    ) -> Result<()> {
        distribution.validate()?;
        for tile in self.tiles.iter_mut() {
            *tile = distribution.sample(rng);
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The region covering exactly the world
    pub fn bounds(&self) -> Region {
        Region::new(0, 0, self.width as i64 - 1, self.height as i64 - 1)
    }

    pub fn is_outside(&self, x: i64, y: i64) -> bool {
        !self.bounds().contains(Position::new(x, y))
    }

    pub fn is_walkable(&self, x: i64, y: i64) -> bool {
        self.tile(Position::new(x, y)).is_walkable()
    }

    /// Tile at `pos`; outside cells read as obstacles
    pub fn tile(&self, pos: Position) -> TileKind {
        self.index(pos)
            .map(|i| self.tiles[i])
            .unwrap_or(TileKind::Obstacle)
    }

    pub fn set_tile(&mut self, pos: Position, kind: TileKind) -> Result<()> {
        let i = self
            .index(pos)
            .ok_or_else(|| error::out_of_bounds(pos, self.width, self.height))?;
        self.tiles[i] = kind;
        Ok(())
    }

    /// Turn food at `pos` into floor. Returns whether there was food.
    pub fn consume_food(&mut self, pos: Position) -> bool {
        match self.index(pos) {
            Some(i) if self.tiles[i] == TileKind::Food => {
                self.tiles[i] = TileKind::Floor;
                true
            }
            _ => false,
        }
    }

    pub fn food_count(&self) -> usize {
        self.tiles.iter().filter(|t| **t == TileKind::Food).count()
    }

    /// Render `region`, drawing `marker` (the agent) as `@`
    pub fn render(&self, region: Region, marker: Option<Position>) -> String {
        let mut out = String::new();
        let mut y = region.max_y;
        while y >= region.min_y {
            for x in region.min_x..=region.max_x {
                let pos = Position::new(x, y);
                let c = if self.is_outside(x, y) {
                    TileKind::Obstacle.as_char()
                } else if marker == Some(pos) {
                    AGENT_CHAR
                } else {
                    self.tile(pos).as_char()
                };
                out.push(c);
            }
            if y > region.min_y {
                out.push('\n');
            }
            y -= 1;
        }
        out
    }

    /// Render the whole world
    pub fn render_full(&self, marker: Option<Position>) -> String {
        self.render(self.bounds(), marker)
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.is_outside(pos.x, pos.y) {
            None
        } else {
            Some(pos.y as usize * self.width + pos.x as usize)
        }
    }
}
