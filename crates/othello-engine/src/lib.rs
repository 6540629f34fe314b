//! Othello rules engine.
//!
//! Everything in this crate is a pure function over a [`Board`] value.
//! There is no shared mutable state: callers own their boards and receive
//! new ones back from [`apply_move`].
//!
//! ```text
//! legal_moves ─┐
//! captures ────┼──→ apply_move ──→ next_turn ──→ score
//! ```
//!
//! # Conventions
//!
//! Coordinates are `(x, y)` with both in `0..8`. The starting position puts
//! BLACK on `(3,3)`/`(4,4)` and WHITE on `(3,4)`/`(4,3)`, and WHITE moves
//! first, so WHITE opens on one of `(2,3)`, `(3,2)`, `(4,5)` or `(5,4)`.

mod board;
mod error;
mod rules;

pub use board::{BOARD_SIZE, Board, Color, Position, Score, Turn};
pub use error::EngineError;
pub use rules::{
    AppliedMove, apply_move, captures, has_legal_move, legal_moves, next_turn,
    score,
};
