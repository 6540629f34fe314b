//! Per-room fan-out to attached connections.

use std::collections::BTreeMap;

use othello_protocol::{Recipient, ServerMessage};
use othello_transport::ConnectionId;
use tokio::sync::mpsc;

/// Channel a room uses to reach one connection's writer task.
pub type ConnectionSender = mpsc::UnboundedSender<ServerMessage>;

/// The live connections of one room.
///
/// Messages are delivered in the order they are dispatched; connections
/// are visited in id order. A closed receiver is skipped silently; the
/// connection's detach arrives separately.
#[derive(Debug, Default)]
pub(crate) struct ConnectionHub {
    senders: BTreeMap<ConnectionId, ConnectionSender>,
}

impl ConnectionHub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, conn: ConnectionId, sender: ConnectionSender) {
        self.senders.insert(conn, sender);
    }

    pub(crate) fn remove(&mut self, conn: ConnectionId) -> bool {
        self.senders.remove(&conn).is_some()
    }

    pub(crate) fn contains(&self, conn: ConnectionId) -> bool {
        self.senders.contains_key(&conn)
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    pub(crate) fn send_to(&self, conn: ConnectionId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&conn) {
            let _ = sender.send(msg);
        }
    }

    /// Delivers each message to every connection its recipient includes.
    pub(crate) fn dispatch(&self, msgs: Vec<(Recipient, ServerMessage)>) {
        for (recipient, msg) in msgs {
            match recipient {
                Recipient::Connection(conn) => self.send_to(conn, msg),
                _ => {
                    for (conn, sender) in &self.senders {
                        if recipient.includes(*conn) {
                            let _ = sender.send(msg.clone());
                        }
                    }
                }
            }
        }
    }
}
