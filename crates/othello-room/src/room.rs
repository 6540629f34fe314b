//! Room actor: an isolated Tokio task that owns one [`RoomState`].
//!
//! Every action on a room goes through its command channel, so actions on
//! one room form a single total order while different rooms run in
//! parallel. Bot moves are the one thing the actor does not do inline: it
//! spawns the request and the answer re-enters as a command.

use std::sync::Arc;
use std::time::Duration;

use othello_protocol::{ClientMessage, RoomId, RoomSummary, ServerMessage};
use othello_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::bridge::{BotAnswer, BotBridge};
use crate::hub::{ConnectionHub, ConnectionSender};
use crate::{BotCapability, Identity, RatingService, RoomConfig, RoomError, RoomState};

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    Attach {
        conn: ConnectionId,
        name: Option<String>,
        sender: ConnectionSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Detach {
        conn: ConnectionId,
    },

    /// A decoded client message. The reply carries the same error the
    /// connection was sent, if any.
    Action {
        conn: ConnectionId,
        msg: ClientMessage,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    BotAnswer(BotAnswer),

    Summary {
        reply: oneshot::Sender<RoomSummary>,
    },

    /// Stops the room if it has had no connections for at least `ttl`.
    /// Replies whether it stopped.
    Expire {
        ttl: Duration,
        reply: oneshot::Sender<bool>,
    },

    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone; it is an `mpsc::Sender` wrapper.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Attaches a connection. Its first message on `sender` is `init`.
    pub async fn attach(
        &self,
        conn: ConnectionId,
        name: Option<String>,
        sender: ConnectionSender,
    ) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Attach {
            conn,
            name,
            sender,
            reply,
        })
        .await?;
        rx.await.map_err(|_| self.unavailable())?
    }

    /// Detaches a connection, standing it up if seated (fire-and-forget).
    pub async fn detach(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Detach { conn }).await
    }

    /// Applies a client action and waits for the outcome.
    pub async fn act(&self, conn: ConnectionId, msg: ClientMessage) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Action { conn, msg, reply }).await?;
        rx.await.map_err(|_| self.unavailable())?
    }

    pub async fn summary(&self) -> Result<RoomSummary, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Summary { reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Stops the room if it has been empty for at least `ttl`.
    ///
    /// The check runs inside the actor, so an attach queued before it
    /// keeps the room alive. Returns `true` if the room stopped.
    pub async fn expire(&self, ttl: Duration) -> Result<bool, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Expire { ttl, reply }).await?;
        rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Whether both handles reach the same actor. A room recreated under
    /// an old id is a different room.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    state: RoomState,
    hub: ConnectionHub,
    bridge: BotBridge,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Lets spawned bot requests report back without keeping the room alive.
    mailbox: mpsc::WeakSender<RoomCommand>,
    idle_since: Option<Instant>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        let room_id = self.state.room_id().clone();
        tracing::info!(%room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Attach {
                    conn,
                    name,
                    sender,
                    reply,
                } => {
                    let result = self.handle_attach(conn, name, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Detach { conn } => self.handle_detach(conn),
                RoomCommand::Action { conn, msg, reply } => {
                    let result = self.handle_action(conn, msg);
                    // Any bot request goes out before the caller hears back.
                    self.schedule_bot();
                    let _ = reply.send(result);
                }
                RoomCommand::BotAnswer(answer) => {
                    self.handle_bot_answer(answer);
                    self.schedule_bot();
                }
                RoomCommand::Summary { reply } => {
                    let _ = reply.send(self.state.summary());
                }
                RoomCommand::Expire { ttl, reply } => {
                    let expired = self.idle_since.is_some_and(|since| since.elapsed() >= ttl);
                    let _ = reply.send(expired);
                    if expired {
                        tracing::info!(%room_id, "room expired");
                        break;
                    }
                }
                RoomCommand::Shutdown => {
                    tracing::info!(%room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(%room_id, "room actor stopped");
    }

    fn handle_attach(
        &mut self,
        conn: ConnectionId,
        name: Option<String>,
        sender: ConnectionSender,
    ) -> Result<(), RoomError> {
        if self.hub.contains(conn) {
            return Err(RoomError::MalformedMessage(format!("{conn} is already attached")));
        }
        self.hub.add(conn, sender);
        let out = self.state.attach(conn, name);
        self.hub.dispatch(out);
        self.idle_since = None;
        tracing::info!(
            room_id = %self.state.room_id(),
            conn_id = %conn,
            connections = self.hub.len(),
            "connection attached"
        );
        Ok(())
    }

    fn handle_detach(&mut self, conn: ConnectionId) {
        if !self.hub.remove(conn) {
            return;
        }
        let out = self.state.detach(conn);
        self.hub.dispatch(out);
        if self.hub.is_empty() {
            self.idle_since = Some(Instant::now());
        }
        tracing::info!(
            room_id = %self.state.room_id(),
            conn_id = %conn,
            connections = self.hub.len(),
            "connection detached"
        );
    }

    fn handle_action(&mut self, conn: ConnectionId, msg: ClientMessage) -> Result<(), RoomError> {
        if !self.hub.contains(conn) {
            tracing::warn!(
                room_id = %self.state.room_id(),
                conn_id = %conn,
                "message from unattached connection, ignoring"
            );
            return Err(RoomError::MalformedMessage("connection is not attached".into()));
        }

        let action = msg.action();
        let result = match msg {
            ClientMessage::Name { name } => self.state.rename(conn, name),
            ClientMessage::Sit { color, name } => self.state.sit(conn, color, name),
            ClientMessage::Stand => self.state.stand_up(conn),
            ClientMessage::Bot { color, bot } => self.state.invite_bot(color, &bot),
            ClientMessage::Move { x, y, color } => {
                self.state
                    .submit_move(&Identity::Connection(conn), color, x, y)
            }
            ClientMessage::Restart => self.state.restart(conn),
            ClientMessage::Load { snapshot } => self.state.load_snapshot(conn, snapshot),
            ClientMessage::Chat { name, text } => self.state.chat(conn, name, text),
        };

        match result {
            Ok(out) => {
                self.hub.dispatch(out);
                Ok(())
            }
            Err(err) => {
                tracing::debug!(
                    room_id = %self.state.room_id(),
                    conn_id = %conn,
                    action,
                    %err,
                    "action rejected"
                );
                self.hub.send_to(
                    conn,
                    ServerMessage::Error {
                        message: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }

    fn handle_bot_answer(&mut self, answer: BotAnswer) {
        let room_id = self.state.room_id().clone();
        let Some(bot) = self.bridge.resolve(&answer) else {
            tracing::debug!(
                %room_id,
                color = %answer.color,
                version = answer.version,
                "discarding stale bot answer"
            );
            return;
        };

        let outcome = match answer.result {
            Ok(Some(at)) => self
                .state
                .submit_move(
                    &Identity::Bot(bot.clone()),
                    answer.color,
                    at.x() as i64,
                    at.y() as i64,
                )
                .map_err(|err| err.to_string()),
            Ok(None) => Err("no move found".to_string()),
            Err(err) => Err(err.to_string()),
        };

        match outcome {
            Ok(out) => {
                tracing::debug!(%room_id, %bot, color = %answer.color, "bot moved");
                self.bridge.record_success();
                self.hub.dispatch(out);
            }
            Err(reason) => {
                let retry = self.bridge.record_failure();
                tracing::warn!(%room_id, %bot, color = %answer.color, %reason, retry, "bot answer rejected");
                if !retry {
                    tracing::warn!(%room_id, %bot, "bot gave up on this position");
                }
            }
        }
    }

    /// Requests a move if a bot is to play and none is outstanding for the
    /// current position.
    fn schedule_bot(&mut self) {
        let wanted = self.state.bot_to_move();
        let version = self.state.version();
        self.bridge
            .retain_current(wanted.as_ref().map(|(color, _)| *color), version);

        let Some((color, bot)) = wanted else {
            return;
        };
        let board = self.state.snapshot().board;
        let Some(request) = self.bridge.request(&bot, color, board, version) else {
            return;
        };
        tracing::debug!(room_id = %self.state.room_id(), %bot, %color, version, "bot move requested");

        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let answer = request.await;
            if let Some(room) = mailbox.upgrade() {
                let _ = room.send(RoomCommand::BotAnswer(answer)).await;
            }
        });
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
pub fn spawn_room(
    room_id: RoomId,
    config: RoomConfig,
    bots: Arc<dyn BotCapability>,
    ratings: Arc<dyn RatingService>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));
    let bridge = BotBridge::new(bots, config.max_bot_retries);
    let state = RoomState::new(room_id.clone(), config, bridge.bot_names(), ratings);

    let actor = RoomActor {
        state,
        hub: ConnectionHub::new(),
        bridge,
        receiver: rx,
        mailbox: tx.downgrade(),
        idle_since: Some(Instant::now()),
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
