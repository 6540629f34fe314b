//! Error types for the rules engine.

use crate::{Color, Position};

/// Errors produced by board construction and move application.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The target cell is occupied, or placing there captures nothing.
    #[error("illegal move for {color} at {at}")]
    IllegalMove { at: Position, color: Color },

    /// A coordinate fell outside the 8×8 grid.
    #[error("position ({x}, {y}) is off the board")]
    OutOfBounds { x: i64, y: i64 },

    /// A wire cell value other than `-1`, `0` or `1`.
    #[error("invalid cell value {0}")]
    InvalidCell(i8),

    /// A wire turn value other than `-1`, `0` or `1`.
    #[error("invalid turn value {0}")]
    InvalidTurn(i8),
}
