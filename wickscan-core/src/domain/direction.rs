//! Closed direction and trend vocabularies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1.0 for buys, -1.0 for sells. Multiplying a distance by the sign moves
    /// a price in the profitable direction.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Buy => 1.0,
            Direction::Sell => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// Trend label derived from swing structure. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendState {
    Up,
    Down,
    Ranging,
}

impl TrendState {
    /// The only direction a signal may take in this trend, if any.
    pub fn allowed_direction(self) -> Option<Direction> {
        match self {
            TrendState::Up => Some(Direction::Buy),
            TrendState::Down => Some(Direction::Sell),
            TrendState::Ranging => None,
        }
    }
}

impl fmt::Display for TrendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendState::Up => write!(f, "UP"),
            TrendState::Down => write!(f, "DOWN"),
            TrendState::Ranging => write!(f, "RANGING"),
        }
    }
}
