//! Error types for the room layer.

use othello_engine::Color;
use othello_protocol::RoomId;

/// Why a room action or supervisor call was rejected.
///
/// Action errors leave the room untouched; the `Display` text is what the
/// originating connection sees in its `error` message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("illegal move at ({x}, {y})")]
    IllegalMove { x: i64, y: i64 },

    #[error("not your turn")]
    NotYourTurn,

    #[error("{0} seat is taken")]
    SeatTaken(Color),

    /// The connection already holds a seat and must stand up first.
    #[error("already seated as {0}")]
    AlreadySeated(Color),

    #[error("you are not seated")]
    NotSeated,

    #[error("unknown bot {0:?}")]
    UnknownBot(String),

    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
