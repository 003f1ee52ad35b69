//! Extract a move from free-form oracle text.
//!
//! The earliest case-insensitive occurrence of `up`, `down`, `left` or
//! `right` wins. Names are plain substrings, so "upward" counts as `up`.
//! Equal start offsets fall back to [`Direction::ALL`] order.

use crate::direction::Direction;
use crate::error::{self, Result};
use serde::{Deserialize, Serialize};

/// A parsed oracle reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleMove {
    pub direction: Direction,
    /// Moves to the nearest food, when the oracle states one after the direction
    pub estimated_moves: Option<u32>,
}

/// Find the leftmost direction name in `text`
pub fn parse_direction(text: &str) -> Result<Direction> {
    find_direction(text)
        .map(|(direction, _)| direction)
        .ok_or_else(|| error::no_direction_found(text).with_operation("parser::parse_direction"))
}

/// Parse the direction and, if present, the first number following it.
///
/// The oracle is asked to answer like `up 3`, but the number is advisory:
/// a reply without one is still a valid move.
pub fn parse_reply(text: &str) -> Result<OracleMove> {
    let (direction, end) = find_direction(text)
        .ok_or_else(|| error::no_direction_found(text).with_operation("parser::parse_reply"))?;

    Ok(OracleMove {
        direction,
        estimated_moves: first_number(&text[end..]),
    })
}

/// Returns the direction and the byte offset just past its name
fn find_direction(text: &str) -> Option<(Direction, usize)> {
    // ASCII lowering keeps byte offsets aligned with `text`
    let lowered = text.to_ascii_lowercase();

    let mut best: Option<(Direction, usize)> = None;
    for direction in Direction::ALL {
        if let Some(index) = lowered.find(direction.name()) {
            if best.map_or(true, |(_, best_index)| index < best_index) {
                best = Some((direction, index));
            }
        }
    }

    best.map(|(direction, index)| (direction, index + direction.name().len()))
}

fn first_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
