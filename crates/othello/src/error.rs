//! Unified error type for the Othello server.

use othello_protocol::ProtocolError;
use othello_room::RoomError;
use othello_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates `From` impls, so the
/// `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum OthelloError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad path).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, unavailable, rejected action).
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use othello_engine::Color;
    use othello_protocol::RoomId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let othello_err: OthelloError = err.into();
        assert!(matches!(othello_err, OthelloError::Transport(_)));
        assert!(othello_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let othello_err: OthelloError = err.into();
        assert!(matches!(othello_err, OthelloError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error_keeps_message() {
        let othello_err: OthelloError = RoomError::SeatTaken(Color::Black).into();
        assert!(matches!(othello_err, OthelloError::Room(_)));
        assert_eq!(othello_err.to_string(), "black seat is taken");

        let othello_err: OthelloError = RoomError::NotFound(RoomId::new("9")).into();
        assert_eq!(othello_err.to_string(), "room 9 not found");
    }
}
