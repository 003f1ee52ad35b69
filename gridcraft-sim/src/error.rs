//! Simulation error helpers
//!
//! Re-exports gridcraft-error and provides simulation-specific constructors.

pub use gridcraft_error::{Error, ErrorKind, ErrorStatus, Result};

use crate::tile::Position;

pub fn config_invalid(message: impl Into<String>) -> Error {
    Error::config_invalid(message)
}

pub fn invalid_argument(message: impl Into<String>) -> Error {
    Error::invalid_argument(message)
}

pub fn parse_failed(message: impl Into<String>) -> Error {
    Error::parse_failed(message)
}

/// A position that does not lie inside the world
pub fn out_of_bounds(pos: Position, width: usize, height: usize) -> Error {
    Error::invalid_argument(format!("{} is outside the {}x{} world", pos, width, height))
        .with_context("position", pos.to_string())
}

pub fn agent_deceased(pos: Position) -> Error {
    Error::agent_deceased(pos.x, pos.y)
}

pub fn no_direction_found(reply: impl Into<String>) -> Error {
    Error::no_direction_found(reply)
}
