//! `OthelloServer` builder and server loop.
//!
//! This is the entry point for running an Othello room server. It ties
//! together all the layers: transport → protocol → room registry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use othello_protocol::{Codec, JsonCodec, RoomId, RoomSummary};
use othello_room::{
    BotCapability, RatingService, RoomConfig, RoomError, RoomRegistry, expire_idle, summarize,
};
use othello_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::handler::handle_connection;
use crate::{EloRatings, LocalBots, OthelloError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The registry
/// lock is only held to look up or create a room, never while a room works.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Arc<Mutex<RoomRegistry>>,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting an Othello server.
///
/// # Example
///
/// ```rust,no_run
/// use othello::prelude::*;
///
/// # async fn start() -> Result<(), OthelloError> {
/// let server = OthelloServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct OthelloServerBuilder {
    config: ServerConfig,
    bots: Option<Arc<dyn BotCapability>>,
    ratings: Option<Arc<dyn RatingService>>,
}

impl OthelloServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            bots: None,
            ratings: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = interval;
        self
    }

    pub fn room_idle_ttl(mut self, ttl: Duration) -> Self {
        self.config.room_idle_ttl = ttl;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Sets the bots rooms can invite. Defaults to [`LocalBots::standard`].
    pub fn bots(mut self, bots: impl BotCapability) -> Self {
        self.bots = Some(Arc::new(bots));
        self
    }

    /// Sets the rating service. Defaults to [`EloRatings`], persisted when
    /// `ratings_path` is configured.
    pub fn ratings(mut self, ratings: impl RatingService) -> Self {
        self.ratings = Some(Arc::new(ratings));
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<OthelloServer<JsonCodec>, OthelloError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let bots: Arc<dyn BotCapability> = match self.bots {
            Some(bots) => bots,
            None => Arc::new(LocalBots::standard()),
        };
        let ratings: Arc<dyn RatingService> = match (self.ratings, &self.config.ratings_path) {
            (Some(ratings), _) => ratings,
            (None, Some(path)) => Arc::new(EloRatings::load(path)),
            (None, None) => Arc::new(EloRatings::in_memory()),
        };

        let registry = RoomRegistry::new(self.config.room.clone(), bots, ratings);
        let state = Arc::new(ServerState {
            rooms: Arc::new(Mutex::new(registry)),
            codec: JsonCodec,
            config: self.config,
        });

        Ok(OthelloServer { transport, state })
    }
}

impl Default for OthelloServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Othello server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct OthelloServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl OthelloServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> OthelloServerBuilder {
        OthelloServerBuilder::new()
    }
}

impl<C> OthelloServer<C>
where
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, OthelloError> {
        Ok(self.transport.local_addr()?)
    }

    /// A handle for managing rooms while the server runs.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            rooms: Arc::clone(&self.state.rooms),
        }
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// A background task destroys rooms that stay empty past
    /// `room_idle_ttl`. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), OthelloError> {
        tracing::info!("Othello server running");

        let sweeper = tokio::spawn(sweep_idle_rooms(
            Arc::clone(&self.state.rooms),
            self.state.config.room_idle_ttl,
            self.state.config.sweep_interval,
        ));
        let _sweeper = AbortOnDrop(sweeper);

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

struct AbortOnDrop(tokio::task::JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn sweep_idle_rooms(rooms: Arc<Mutex<RoomRegistry>>, ttl: Duration, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let handles = rooms.lock().await.room_handles();
        let expired = expire_idle(&handles, ttl).await;
        if expired.is_empty() {
            continue;
        }
        let mut registry = rooms.lock().await;
        let reaped = expired.iter().filter(|room| registry.forget(room)).count();
        tracing::info!(count = reaped, "reaped idle rooms");
    }
}

/// Room management for code outside the connection handlers, such as a
/// lobby page.
#[derive(Clone)]
pub struct ServerHandle {
    rooms: Arc<Mutex<RoomRegistry>>,
}

impl ServerHandle {
    /// Summaries of every live room, ordered by id.
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let handles = self.rooms.lock().await.room_handles();
        summarize(&handles).await
    }

    /// Opens a room under a fresh numeric id.
    pub async fn create_room(&self) -> RoomId {
        self.rooms.lock().await.create_room()
    }

    /// Shuts a room down and closes its connections.
    pub async fn destroy_room(&self, room_id: &RoomId) -> Result<(), RoomError> {
        let room = self.rooms.lock().await.remove(room_id)?;
        // Already stopped is as good as shut down.
        let _ = room.shutdown().await;
        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }
}
