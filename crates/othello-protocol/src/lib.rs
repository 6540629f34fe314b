//! Wire protocol for Othello rooms.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Snapshot`], etc.):
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! The protocol layer sits between transport (raw bytes) and rooms (game
//! state). It doesn't know about connections' lifecycles or rules; it only
//! knows message shapes.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Room (actions)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ChatLine, ClientMessage, Ratings, Recipient, RoomId, RoomPhase, RoomSummary, Roster,
    SavedGame, ServerMessage, Snapshot,
};
