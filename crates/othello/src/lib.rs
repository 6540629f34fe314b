//! # Othello
//!
//! Multiplayer Othello rooms over WebSockets.
//!
//! A client opens `ws://host/ws/{room}?name=Ann` and is attached to that
//! room, which is created on first use. Every connection in a room sees the
//! same board, seats, chat and bot moves in the same order. Seated players
//! move; everyone else watches.
//!
//! This crate wires the layers together:
//!
//! ```text
//! othello-transport → othello-protocol → othello-room → othello-engine
//!                                             ↓
//!                                        othello-bots
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use othello::prelude::*;
//!
//! # async fn start() -> Result<(), OthelloError> {
//! let server = OthelloServer::builder()
//!     .config(ServerConfig::from_env())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod bots;
mod config;
mod error;
mod handler;
mod ratings;
mod server;

pub use bots::LocalBots;
pub use config::ServerConfig;
pub use error::OthelloError;
pub use ratings::{EloRatings, INITIAL_RATING, K_FACTOR};
pub use server::{OthelloServer, OthelloServerBuilder, ServerHandle};

/// The types most servers need.
pub mod prelude {
    pub use crate::{
        EloRatings, LocalBots, OthelloError, OthelloServer, OthelloServerBuilder, ServerConfig,
        ServerHandle,
    };
    pub use othello_protocol::{ClientMessage, RoomId, RoomSummary, ServerMessage};
    pub use othello_room::{BotCapability, RatingService, RoomConfig};
}
