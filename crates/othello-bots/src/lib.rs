//! Automated Othello players.
//!
//! Each bot is a [`Strategy`]: given a board and the color to move, it
//! picks one legal placement or returns `None` when there is none. All
//! strategies are synchronous and CPU-bound; callers that live on an async
//! runtime should run them on the blocking pool.
//!
//! | name           | strategy                                         |
//! |----------------|--------------------------------------------------|
//! | `David`        | [`Greedy`]: most discs flipped                   |
//! | `Roger`        | [`Mobility`]: fewest replies for the opponent    |
//! | `Minnie`       | [`Minimax`]: depth-3 search over square weights  |
//! | `Sasha senior` | [`AlphaBeta`] to depth 6                         |
//! | `Sasha junior` | [`AlphaBeta`] to depth 5                         |
//! | `Sasha intern` | [`AlphaBeta`] to depth 4                         |
//! | `Random`       | [`RandomMover`]: any legal move                  |
//!
//! [`BotRoster`] maps these names to shared strategy instances.

mod greedy;
mod minimax;
mod mobility;
mod random;
mod roster;
mod search;

use othello_engine::{Board, Color, Position};

pub use greedy::Greedy;
pub use minimax::Minimax;
pub use mobility::Mobility;
pub use random::RandomMover;
pub use roster::BotRoster;
pub use search::AlphaBeta;

/// A move-selection algorithm.
pub trait Strategy: Send + Sync {
    /// Picks a legal move for `color`, or `None` if it has none.
    fn choose(&self, board: &Board, color: Color) -> Option<Position>;
}
