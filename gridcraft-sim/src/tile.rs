//! Tile kinds and grid coordinates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Character used for the agent in rendered boards
pub const AGENT_CHAR: char = '@';

/// The static category of a grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    Obstacle,
    Floor,
    Food,
}

impl TileKind {
    /// Wire character for this tile
    pub fn as_char(&self) -> char {
        match self {
            TileKind::Obstacle => '#',
            TileKind::Floor => '.',
            TileKind::Food => 'F',
        }
    }

    /// Inverse of [`TileKind::as_char`]. The agent marker is not a tile.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(TileKind::Obstacle),
            '.' => Some(TileKind::Floor),
            'F' => Some(TileKind::Food),
            _ => None,
        }
    }

    pub fn is_walkable(&self) -> bool {
        !matches!(self, TileKind::Obstacle)
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A cell coordinate. `y` grows upward.
///
/// Signed so that neighbours of edge cells can be expressed; anything outside
/// the world is an implicit wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i64, dy: i64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
