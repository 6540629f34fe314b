//! Protocol types for the room channel.
//!
//! Every type here travels on the wire as JSON. Client messages are
//! internally tagged by `"action"`, server messages by `"type"`, both in
//! `snake_case`:
//!
//! ```text
//! C → S  {"action":"move","x":2,"y":3,"color":"white"}
//! S → C  {"type":"update","board":[[0,..],..],"current":1,...}
//! ```
//!
//! Board-level values (`Board`, `Turn`, `Color`, `Position`) come from
//! `othello-engine` and carry their own wire shapes.

use std::fmt;

use othello_engine::{Board, Color, Position, Turn};
use othello_transport::ConnectionId;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity and addressing
// ---------------------------------------------------------------------------

/// Identifier of a room, taken verbatim from the connection path.
///
/// `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Who should receive a server message.
///
/// Rooms address connections, not players: a spectator has no seat but
/// still receives every broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every connection attached to the room.
    All,

    /// One connection.
    Connection(ConnectionId),

    /// Every connection except one, e.g. "a new spectator arrived" goes
    /// to everyone but the newcomer, who gets a full `init` instead.
    AllExcept(ConnectionId),
}

impl Recipient {
    /// Returns `true` if a message for this recipient goes to `conn`.
    pub fn includes(&self, conn: ConnectionId) -> bool {
        match self {
            Self::All => true,
            Self::Connection(target) => *target == conn,
            Self::AllExcept(excluded) => *excluded != conn,
        }
    }
}

// ---------------------------------------------------------------------------
// Shared view fragments
// ---------------------------------------------------------------------------

/// Display names of the two seat occupants; `null` for an empty seat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub black: Option<String>,
    pub white: Option<String>,
}

impl Roster {
    pub fn get(&self, color: Color) -> Option<&str> {
        match color {
            Color::Black => self.black.as_deref(),
            Color::White => self.white.as_deref(),
        }
    }

    pub fn set(&mut self, color: Color, name: Option<String>) {
        match color {
            Color::Black => self.black = name,
            Color::White => self.white = name,
        }
    }
}

/// Last known rating of each seat occupant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub black: Option<i32>,
    pub white: Option<i32>,
}

impl Ratings {
    pub fn get(&self, color: Color) -> Option<i32> {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    pub fn set(&mut self, color: Color, rating: Option<i32>) {
        match color {
            Color::Black => self.black = rating,
            Color::White => self.white = rating,
        }
    }
}

/// Lifecycle phase of a room's game.
///
/// ```text
///   Waiting ──both seats filled──→ InProgress ──no legal moves──→ Finished
///      ↑                               │                             │
///      └────────seat vacated───────────┘←──────────restart───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPhase {
    Waiting,
    InProgress,
    Finished,
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

/// Board, side to move and last placement at one point in a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub board: Board,
    pub current: Turn,
    /// `[x, y]` of the most recent placement, `null` before the first move.
    #[serde(default)]
    pub last: Option<Position>,
}

impl Snapshot {
    /// The starting position with WHITE to move.
    pub fn initial() -> Self {
        Self {
            board: Board::initial(),
            current: Turn::White,
            last: None,
        }
    }
}

/// A client-held save, accepted in two shapes:
///
/// - `{"history": [snapshot, ...]}`: a full game record; the last entry is
///   the resume point.
/// - a bare snapshot `{board, current, last}`.
///
/// `#[serde(untagged)]` tries each shape in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedGame {
    History { history: Vec<Snapshot> },
    Single(Snapshot),
}

impl SavedGame {
    /// Flattens the save into its snapshots, oldest first.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidMessage` for an empty history.
    pub fn into_snapshots(self) -> Result<Vec<Snapshot>, ProtocolError> {
        match self {
            Self::History { history } if history.is_empty() => Err(
                ProtocolError::InvalidMessage("saved game has no snapshots".into()),
            ),
            Self::History { history } => Ok(history),
            Self::Single(snapshot) => Ok(vec![snapshot]),
        }
    }
}

/// One chat line as replayed to late joiners in `init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub author: String,
    pub text: String,
    /// Arrival order within the room, starting at 1.
    pub seq: u64,
}

/// A room as reported to an external lobby listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: RoomId,
    /// Human-friendly label, e.g. `Game 3`.
    pub name: String,
    pub players: Roster,
    pub phase: RoomPhase,
    /// Attached connections, spectators included.
    pub connections: usize,
}

// ---------------------------------------------------------------------------
// ClientMessage (client → server)
// ---------------------------------------------------------------------------

/// Everything a client can ask a room to do.
///
/// `#[serde(tag = "action")]` produces `{"action": "sit", "color": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Declare a display name for this connection.
    Name { name: String },

    /// Take a seat. `name` optionally renames the connection first.
    Sit {
        color: Color,
        #[serde(default)]
        name: Option<String>,
    },

    /// Vacate the seat this connection holds.
    Stand,

    /// Put a bot in an empty seat.
    Bot { color: Color, bot: String },

    /// Place a disc. Coordinates are signed so that off-board moves reach
    /// the rules engine and are rejected as illegal rather than malformed.
    Move { x: i64, y: i64, color: Color },

    /// Reset the board to the starting position.
    Restart,

    /// Resume from a client-held save.
    Load { snapshot: SavedGame },

    /// Say something. `name` overrides the connection's display name;
    /// older clients send the text as `message`.
    Chat {
        #[serde(default)]
        name: Option<String>,
        #[serde(alias = "message")]
        text: String,
    },
}

impl ClientMessage {
    /// The `action` tag, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Name { .. } => "name",
            Self::Sit { .. } => "sit",
            Self::Stand => "stand",
            Self::Bot { .. } => "bot",
            Self::Move { .. } => "move",
            Self::Restart => "restart",
            Self::Load { .. } => "load",
            Self::Chat { .. } => "chat",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage (server → client)
// ---------------------------------------------------------------------------

/// Everything a room sends to its connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full room view, sent once to a connection right after it attaches.
    Init {
        /// The seat this connection holds, `null` for a spectator.
        color: Option<Color>,
        board: Board,
        current: Turn,
        players: Roster,
        ratings: Ratings,
        spectators: Vec<String>,
        last: Option<Position>,
        /// Names accepted by the `bot` action.
        bots: Vec<String>,
        /// Recent chat, oldest first.
        chat: Vec<ChatLine>,
    },

    /// Board changed (move, restart or load).
    Update {
        board: Board,
        current: Turn,
        players: Roster,
        ratings: Ratings,
        spectators: Vec<String>,
        last: Option<Position>,
    },

    /// Roster, ratings or spectators changed without a board change.
    Players {
        current: Turn,
        players: Roster,
        ratings: Ratings,
        spectators: Vec<String>,
    },

    /// This connection's seat changed; `null` after standing up.
    Seat { color: Option<Color> },

    Chat { author: String, text: String, seq: u64 },

    /// The connection's last action was rejected; nothing changed.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The browser client parses these shapes directly, so the tests pin
    //! the JSON rather than round-tripping.

    use serde_json::json;

    use super::*;

    fn decode(value: serde_json::Value) -> Result<ClientMessage, serde_json::Error> {
        serde_json::from_value(value)
    }

    fn pos(x: i64, y: i64) -> Position {
        Position::new(x, y).unwrap()
    }

    // =====================================================================
    // Identity
    // =====================================================================

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&RoomId::new("42")).unwrap(), "\"42\"");
        assert_eq!(RoomId::from("lobby").to_string(), "lobby");
    }

    #[test]
    fn test_recipient_includes() {
        let a = ConnectionId::new(1);
        let b = ConnectionId::new(2);
        assert!(Recipient::All.includes(a));
        assert!(Recipient::Connection(a).includes(a));
        assert!(!Recipient::Connection(a).includes(b));
        assert!(!Recipient::AllExcept(a).includes(a));
        assert!(Recipient::AllExcept(a).includes(b));
    }

    // =====================================================================
    // ClientMessage
    // =====================================================================

    #[test]
    fn test_client_sit_with_and_without_name() {
        let msg = decode(json!({"action": "sit", "color": "black", "name": "Ann"})).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Sit {
                color: Color::Black,
                name: Some("Ann".into())
            }
        );
        let msg = decode(json!({"action": "sit", "color": "white"})).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Sit {
                color: Color::White,
                name: None
            }
        );
    }

    #[test]
    fn test_client_move_keeps_off_board_coordinates() {
        let msg = decode(json!({"action": "move", "x": -1, "y": 9, "color": "white"})).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Move {
                x: -1,
                y: 9,
                color: Color::White
            }
        );
    }

    #[test]
    fn test_client_unit_actions() {
        assert_eq!(decode(json!({"action": "stand"})).unwrap(), ClientMessage::Stand);
        assert_eq!(decode(json!({"action": "restart"})).unwrap(), ClientMessage::Restart);
    }

    #[test]
    fn test_client_bot_invite() {
        let msg = decode(json!({"action": "bot", "color": "black", "bot": "Sasha senior"})).unwrap();
        assert_eq!(msg.action(), "bot");
        assert_eq!(
            msg,
            ClientMessage::Bot {
                color: Color::Black,
                bot: "Sasha senior".into()
            }
        );
    }

    #[test]
    fn test_client_chat_accepts_message_alias() {
        let msg = decode(json!({"action": "chat", "name": "Ann", "message": "hi"})).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Chat {
                name: Some("Ann".into()),
                text: "hi".into()
            }
        );
        let msg = decode(json!({"action": "chat", "text": "yo"})).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Chat {
                name: None,
                text: "yo".into()
            }
        );
    }

    #[test]
    fn test_client_load_single_snapshot() {
        let board = serde_json::to_value(Board::initial()).unwrap();
        let msg = decode(json!({
            "action": "load",
            "snapshot": {"board": board, "current": -1, "last": null}
        }))
        .unwrap();
        let ClientMessage::Load { snapshot } = msg else {
            panic!("expected load");
        };
        assert_eq!(snapshot.into_snapshots().unwrap(), vec![Snapshot::initial()]);
    }

    #[test]
    fn test_client_load_history_resumes_from_last_entry() {
        let board = serde_json::to_value(Board::initial()).unwrap();
        let msg = decode(json!({
            "action": "load",
            "snapshot": {"history": [
                {"board": board, "current": -1},
                {"board": board, "current": 1, "last": [2, 3]}
            ]}
        }))
        .unwrap();
        let ClientMessage::Load { snapshot } = msg else {
            panic!("expected load");
        };
        let snapshots = snapshot.into_snapshots().unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].current, Turn::Black);
        assert_eq!(snapshots[1].last, Some(pos(2, 3)));
    }

    #[test]
    fn test_saved_game_empty_history_is_invalid() {
        let saved: SavedGame = serde_json::from_value(json!({"history": []})).unwrap();
        assert!(matches!(
            saved.into_snapshots(),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_client_load_rejects_bad_board() {
        let result = decode(json!({
            "action": "load",
            "snapshot": {"board": [[7]], "current": 1}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_client_unknown_action_is_error() {
        assert!(decode(json!({"action": "fly", "speed": 9000})).is_err());
        assert!(decode(json!({"color": "black"})).is_err());
    }

    #[test]
    fn test_client_bad_color_is_error() {
        assert!(decode(json!({"action": "sit", "color": "green"})).is_err());
    }

    // =====================================================================
    // ServerMessage
    // =====================================================================

    #[test]
    fn test_server_init_json_shape() {
        let msg = ServerMessage::Init {
            color: None,
            board: Board::initial(),
            current: Turn::White,
            players: Roster {
                black: Some("Ann".into()),
                white: None,
            },
            ratings: Ratings {
                black: Some(1500),
                white: None,
            },
            spectators: vec!["Guest".into()],
            last: None,
            bots: vec!["David".into()],
            chat: vec![ChatLine {
                author: "Ann".into(),
                text: "hi".into(),
                seq: 1,
            }],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "init");
        assert!(json["color"].is_null());
        assert_eq!(json["current"], -1);
        assert_eq!(json["board"][3][3], 1);
        assert_eq!(json["players"], json!({"black": "Ann", "white": null}));
        assert_eq!(json["ratings"], json!({"black": 1500, "white": null}));
        assert_eq!(json["spectators"], json!(["Guest"]));
        assert!(json["last"].is_null());
        assert_eq!(json["bots"], json!(["David"]));
        assert_eq!(json["chat"][0]["seq"], 1);
    }

    #[test]
    fn test_server_update_json_shape() {
        let msg = ServerMessage::Update {
            board: Board::initial(),
            current: Turn::GameOver,
            players: Roster::default(),
            ratings: Ratings::default(),
            spectators: vec![],
            last: Some(pos(2, 3)),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "update");
        assert_eq!(json["current"], 0);
        assert_eq!(json["last"], json!([2, 3]));
    }

    #[test]
    fn test_server_players_and_seat_json_shape() {
        let json = serde_json::to_value(ServerMessage::Players {
            current: Turn::Black,
            players: Roster::default(),
            ratings: Ratings::default(),
            spectators: vec![],
        })
        .unwrap();
        assert_eq!(json["type"], "players");
        assert_eq!(json["current"], 1);
        assert!(json.get("board").is_none());

        let json = serde_json::to_value(ServerMessage::Seat {
            color: Some(Color::White),
        })
        .unwrap();
        assert_eq!(json, json!({"type": "seat", "color": "white"}));
    }

    #[test]
    fn test_server_chat_and_error_json_shape() {
        let json = serde_json::to_value(ServerMessage::Chat {
            author: "Ann".into(),
            text: "gg".into(),
            seq: 4,
        })
        .unwrap();
        assert_eq!(json, json!({"type": "chat", "author": "Ann", "text": "gg", "seq": 4}));

        let json = serde_json::to_value(ServerMessage::Error {
            message: "Seat taken".into(),
        })
        .unwrap();
        assert_eq!(json, json!({"type": "error", "message": "Seat taken"}));
    }

    #[test]
    fn test_room_summary_json_shape() {
        let summary = RoomSummary {
            room_id: RoomId::new("3"),
            name: "Game 3".into(),
            players: Roster::default(),
            phase: RoomPhase::InProgress,
            connections: 2,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["room_id"], "3");
        assert_eq!(json["phase"], "in_progress");
    }

    #[test]
    fn test_roster_and_ratings_accessors() {
        let mut roster = Roster::default();
        roster.set(Color::White, Some("Bo".into()));
        assert_eq!(roster.get(Color::White), Some("Bo"));
        assert_eq!(roster.get(Color::Black), None);

        let mut ratings = Ratings::default();
        ratings.set(Color::Black, Some(1516));
        assert_eq!(ratings.get(Color::Black), Some(1516));
    }
}
