//! Per-connection handler: room lookup, attach, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Parse the request path → room id and display name
//!   2. Attach to the room → the room sends `init`
//!   3. Spawn a writer that drains the room's messages onto the socket and
//!      pings the client
//!   4. Loop: receive frames → decode → hand to the room, until the client
//!      leaves, stops answering pings, or the room closes

use std::sync::Arc;
use std::time::Duration;

use othello_protocol::{ClientMessage, Codec, ProtocolError, RoomId, ServerMessage};
use othello_room::{ConnectionSender, RoomError, RoomHandle};
use othello_transport::{Connection, ConnectionId, WebSocketConnection};
use percent_encoding::percent_decode_str;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::OthelloError;
use crate::server::ServerState;

/// Where a connection asked to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Target {
    pub(crate) room_id: RoomId,
    pub(crate) name: Option<String>,
}

/// Parses `/ws/{room}` or `/{room}`, with an optional `?name=...`.
pub(crate) fn parse_target(target: &str) -> Result<Target, ProtocolError> {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    let path = path.trim_start_matches('/');
    let room = path.strip_prefix("ws/").unwrap_or(path);
    let room = room.strip_suffix('/').unwrap_or(room);
    if room.is_empty() || room.contains('/') {
        return Err(ProtocolError::InvalidMessage(format!(
            "expected /ws/{{room}}, got {target:?}"
        )));
    }
    let room = decode_component(room)?;

    let name = query
        .into_iter()
        .flat_map(|q| q.split('&'))
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "name")
        .map(|(_, value)| decode_component(value))
        .transpose()?
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    Ok(Target {
        room_id: RoomId::new(room),
        name,
    })
}

fn decode_component(raw: &str) -> Result<String, ProtocolError> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ProtocolError::InvalidMessage(format!("bad percent-encoding in {raw:?}: {e}")))
}

/// Drop guard that detaches the connection from its room when the handler
/// exits.
///
/// This ensures the seat is released even if the handler panics. Since
/// `Drop` is synchronous, we spawn a fire-and-forget task for the send.
struct AttachmentGuard {
    conn: ConnectionId,
    room: RoomHandle,
}

impl Drop for AttachmentGuard {
    fn drop(&mut self) {
        let conn = self.conn;
        let room = self.room.clone();
        tokio::spawn(async move {
            let _ = room.detach(conn).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), OthelloError>
where
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, path = conn.path(), "handling new connection");

    // --- Step 1: Where to? ---
    let target = match parse_target(conn.path()) {
        Ok(target) => target,
        Err(e) => {
            send_error(&conn, &state.codec, &e.to_string()).await?;
            let _ = conn.close().await;
            return Err(e.into());
        }
    };

    // --- Step 2: Attach ---
    // The room owns the only strong sender, so the writer's channel closes
    // when the room goes away.
    let (tx, rx) = mpsc::unbounded_channel();
    let errors = tx.downgrade();
    let room = match attach(&state, conn_id, &target, tx).await {
        Ok(room) => room,
        Err(e) => {
            send_error(&conn, &state.codec, &e.to_string()).await?;
            let _ = conn.close().await;
            return Err(e.into());
        }
    };
    let guard = AttachmentGuard {
        conn: conn_id,
        room: room.clone(),
    };
    tracing::info!(%conn_id, room_id = %target.room_id, "connection joined room");

    // --- Step 3: Writer ---
    let mut writer = tokio::spawn(write_loop(
        Arc::clone(&conn),
        rx,
        state.codec.clone(),
        state.config.ping_interval,
    ));

    // --- Step 4: Message loop ---
    let mut liveness = tokio::time::interval(state.config.ping_interval);
    liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        let received = tokio::select! {
            received = conn.recv() => received,
            _ = liveness.tick() => {
                if conn.idle_for() >= state.config.idle_timeout {
                    tracing::info!(%conn_id, "connection timed out");
                    break;
                }
                continue;
            }
            _ = &mut writer => {
                tracing::info!(%conn_id, "room closed the connection");
                break;
            }
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let msg: ClientMessage = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode message");
                let err = RoomError::MalformedMessage(e.to_string());
                if let Some(tx) = errors.upgrade() {
                    let _ = tx.send(ServerMessage::Error {
                        message: err.to_string(),
                    });
                }
                continue;
            }
        };

        match room.act(conn_id, msg).await {
            Ok(()) => {}
            Err(RoomError::Unavailable(room_id)) => {
                tracing::info!(%conn_id, %room_id, "room went away");
                break;
            }
            // The room already told the client.
            Err(e) => tracing::debug!(%conn_id, error = %e, "action rejected"),
        }
    }

    drop(guard);
    writer.abort();
    let _ = conn.close().await;
    Ok(())
}

/// Attaches to the room, creating it if needed. A room reaped between
/// lookup and attach is recreated once.
async fn attach<C: Codec>(
    state: &ServerState<C>,
    conn: ConnectionId,
    target: &Target,
    sender: ConnectionSender,
) -> Result<RoomHandle, RoomError> {
    for _ in 0..2 {
        let room = state.rooms.lock().await.get_or_create(&target.room_id);
        match room.attach(conn, target.name.clone(), sender.clone()).await {
            Ok(()) => return Ok(room),
            Err(RoomError::Unavailable(room_id)) => {
                tracing::debug!(%conn, %room_id, "room closed during attach, retrying");
            }
            Err(e) => return Err(e),
        }
    }
    Err(RoomError::Unavailable(target.room_id.clone()))
}

/// Encodes everything the room addresses to this connection, in order,
/// and pings the client every `ping_every`. Ends when the room drops its
/// sender or the socket fails.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    codec: C,
    ping_every: Duration,
) {
    let conn_id = conn.id();
    let mut pings = tokio::time::interval_at(Instant::now() + ping_every, ping_every);
    pings.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        let msg = tokio::select! {
            msg = rx.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
            _ = pings.tick() => {
                if let Err(e) = conn.ping().await {
                    tracing::debug!(%conn_id, error = %e, "ping failed, stopping writer");
                    break;
                }
                continue;
            }
        };
        let bytes = match codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "failed to encode message");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Sends an `error` frame straight to the socket, bypassing any room.
async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    message: &str,
) -> Result<(), OthelloError> {
    let bytes = codec.encode(&ServerMessage::Error {
        message: message.to_string(),
    })?;
    conn.send(&bytes).await?;
    Ok(())
}
