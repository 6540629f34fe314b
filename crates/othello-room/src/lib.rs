//! Othello rooms.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! board, the two seats and the list of attached connections. Actions on
//! one room are applied strictly in arrival order; rooms never share
//! locks.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates, lists and reaps rooms
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomState`]: the synchronous room aggregate behind each actor
//! - [`SeatManager`]: who sits at BLACK and WHITE
//! - [`BotCapability`]: where bot moves come from
//! - [`RatingService`]: where ratings come from and results go

mod bridge;
mod config;
mod error;
mod hub;
mod ratings;
mod registry;
mod room;
mod seats;
mod state;

pub use bridge::{BotAnswer, BotCapability, BotError, BotRequest};
pub use config::RoomConfig;
pub use error::RoomError;
pub use hub::ConnectionSender;
pub use ratings::RatingService;
pub use registry::{RoomRegistry, expire_idle, summarize};
pub use room::{RoomHandle, spawn_room};
pub use seats::{Identity, Occupant, SeatManager};
pub use state::{HistoryEntry, MoveRecord, Outgoing, RoomState};
