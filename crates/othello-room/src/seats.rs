//! Seat assignment for the two colors.
//!
//! A seat holds either a human, tied to the connection that sat down, or a
//! bot, which has no connection and moves through the bot bridge. Both
//! submit moves as an [`Identity`], so the move path never branches on who
//! is playing.

use othello_engine::Color;
use othello_protocol::Roster;
use othello_transport::ConnectionId;

use crate::RoomError;

/// Who is asking to move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Connection(ConnectionId),
    Bot(String),
}

/// The occupant of a seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupant {
    Human { conn: ConnectionId, name: String },
    Bot { name: String },
}

impl Occupant {
    pub fn name(&self) -> &str {
        match self {
            Self::Human { name, .. } | Self::Bot { name } => name,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self, Self::Bot { .. })
    }

    /// Returns `true` if `identity` may move for this seat.
    pub fn acts_for(&self, identity: &Identity) -> bool {
        match (self, identity) {
            (Self::Human { conn, .. }, Identity::Connection(id)) => conn == id,
            (Self::Bot { name }, Identity::Bot(bot)) => name == bot,
            _ => false,
        }
    }
}

/// Both seats of a room.
///
/// Each color has at most one occupant and a connection holds at most one
/// color.
#[derive(Debug, Clone, Default)]
pub struct SeatManager {
    black: Option<Occupant>,
    white: Option<Occupant>,
}

impl SeatManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupant(&self, color: Color) -> Option<&Occupant> {
        self.slot(color).as_ref()
    }

    /// The color `conn` is seated at, if any.
    pub fn color_of(&self, conn: ConnectionId) -> Option<Color> {
        Color::ALL.into_iter().find(|color| {
            matches!(
                self.occupant(*color),
                Some(Occupant::Human { conn: c, .. }) if *c == conn
            )
        })
    }

    /// Seats a human.
    ///
    /// # Errors
    /// `AlreadySeated` if `conn` holds either seat, `SeatTaken` if `color`
    /// is occupied by someone else.
    pub fn sit(&mut self, color: Color, conn: ConnectionId, name: String) -> Result<(), RoomError> {
        if let Some(held) = self.color_of(conn) {
            return Err(RoomError::AlreadySeated(held));
        }
        if self.occupant(color).is_some() {
            return Err(RoomError::SeatTaken(color));
        }
        *self.slot_mut(color) = Some(Occupant::Human { conn, name });
        Ok(())
    }

    /// Seats a bot.
    ///
    /// # Errors
    /// `SeatTaken` if `color` is occupied.
    pub fn seat_bot(&mut self, color: Color, name: String) -> Result<(), RoomError> {
        if self.occupant(color).is_some() {
            return Err(RoomError::SeatTaken(color));
        }
        *self.slot_mut(color) = Some(Occupant::Bot { name });
        Ok(())
    }

    /// Frees the seat held by `conn` and returns its color.
    pub fn vacate(&mut self, conn: ConnectionId) -> Option<Color> {
        let color = self.color_of(conn)?;
        *self.slot_mut(color) = None;
        Some(color)
    }

    /// Updates the name shown for `conn`'s seat, if it holds one.
    pub fn rename(&mut self, conn: ConnectionId, new_name: &str) -> Option<Color> {
        let color = self.color_of(conn)?;
        if let Some(Occupant::Human { name, .. }) = self.slot_mut(color) {
            *name = new_name.to_string();
        }
        Some(color)
    }

    /// Returns `true` when both colors are occupied.
    pub fn is_full(&self) -> bool {
        self.black.is_some() && self.white.is_some()
    }

    pub fn roster(&self) -> Roster {
        Roster {
            black: self.black.as_ref().map(|o| o.name().to_string()),
            white: self.white.as_ref().map(|o| o.name().to_string()),
        }
    }

    fn slot(&self, color: Color) -> &Option<Occupant> {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
        }
    }

    fn slot_mut(&mut self, color: Color) -> &mut Option<Occupant> {
        match color {
            Color::Black => &mut self.black,
            Color::White => &mut self.white,
        }
    }
}
