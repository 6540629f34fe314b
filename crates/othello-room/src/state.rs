//! The room aggregate.
//!
//! [`RoomState`] is plain synchronous data. Every action either fails with
//! a [`RoomError`] and leaves the state untouched, or applies fully and
//! returns the messages to deliver. The room actor owns one of these and
//! feeds it one command at a time, which is what makes each action atomic.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use othello_engine::{Color, Position, Turn, apply_move, next_turn, score};
use othello_protocol::{
    ChatLine, Ratings, Recipient, RoomId, RoomPhase, RoomSummary, SavedGame, ServerMessage,
    Snapshot,
};
use othello_transport::ConnectionId;
use serde::Serialize;
use tokio::time::Instant;

use crate::{Identity, Occupant, RatingService, RoomConfig, RoomError, SeatManager};

/// Messages produced by one action, in delivery order.
pub type Outgoing = Vec<(Recipient, ServerMessage)>;

/// A placement and what it flipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub color: Color,
    pub x: usize,
    pub y: usize,
    pub captures: Vec<Position>,
}

/// One step of a game: the position after a move, or a starting point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub snapshot: Snapshot,
    /// `None` for the initial position and for loaded snapshots.
    #[serde(rename = "move")]
    pub played: Option<MoveRecord>,
}

impl HistoryEntry {
    fn start(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            played: None,
        }
    }
}

/// A seat freed by a disconnect, held for the name that sat in it.
#[derive(Debug, Clone)]
struct Reclaim {
    color: Color,
    name: String,
    at: Instant,
}

pub struct RoomState {
    room_id: RoomId,
    config: RoomConfig,
    snapshot: Snapshot,
    history: Vec<HistoryEntry>,
    seats: SeatManager,
    /// Attached connections and their display names.
    members: BTreeMap<ConnectionId, String>,
    chat: VecDeque<ChatLine>,
    chat_seq: u64,
    reclaims: Vec<Reclaim>,
    ratings: Ratings,
    rating_service: Arc<dyn RatingService>,
    bots: Vec<String>,
    /// Bumped on every board change; bot answers carry it.
    version: u64,
    /// Whether the current game's result went to the rating service.
    recorded: bool,
}

impl RoomState {
    pub fn new(
        room_id: RoomId,
        config: RoomConfig,
        bots: Vec<String>,
        rating_service: Arc<dyn RatingService>,
    ) -> Self {
        Self {
            room_id,
            config,
            snapshot: Snapshot::initial(),
            history: vec![HistoryEntry::start(Snapshot::initial())],
            seats: SeatManager::new(),
            members: BTreeMap::new(),
            chat: VecDeque::new(),
            chat_seq: 0,
            reclaims: Vec::new(),
            ratings: Ratings::default(),
            rating_service,
            bots,
            version: 0,
            recorded: false,
        }
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Board, side to move and last placement.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn turn(&self) -> Turn {
        self.snapshot.current
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn seats(&self) -> &SeatManager {
        &self.seats
    }

    pub fn ratings(&self) -> Ratings {
        self.ratings
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn connection_count(&self) -> usize {
        self.members.len()
    }

    pub fn phase(&self) -> RoomPhase {
        if self.snapshot.current.is_over() {
            RoomPhase::Finished
        } else if self.seats.is_full() {
            RoomPhase::InProgress
        } else {
            RoomPhase::Waiting
        }
    }

    /// Names of attached connections that hold no seat, in attach order.
    pub fn spectators(&self) -> Vec<String> {
        self.members
            .iter()
            .filter(|(conn, _)| self.seats.color_of(**conn).is_none())
            .map(|(_, name)| name.clone())
            .collect()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.room_id.clone(),
            name: format!("Game {}", self.room_id),
            players: self.seats.roster(),
            phase: self.phase(),
            connections: self.members.len(),
        }
    }

    /// The bot whose turn it is, if the side to move is a bot.
    pub fn bot_to_move(&self) -> Option<(Color, String)> {
        let color = self.snapshot.current.color()?;
        match self.seats.occupant(color)? {
            Occupant::Bot { name } => Some((color, name.clone())),
            Occupant::Human { .. } => None,
        }
    }

    // -----------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------

    /// Adds a connection. It gets a full `init`; everyone else learns of
    /// the new member.
    ///
    /// A declared name that matches a seat freed by a disconnect less than
    /// `reclaim_window` ago takes that seat back.
    pub fn attach(&mut self, conn: ConnectionId, name: Option<String>) -> Outgoing {
        let declared = name.and_then(non_empty);
        let name = declared
            .clone()
            .unwrap_or_else(|| self.config.default_name.clone());
        self.members.insert(conn, name);
        if let Some(declared) = declared {
            self.reclaim_seat(conn, &declared);
        }
        vec![
            (Recipient::Connection(conn), self.init_for(conn)),
            (Recipient::AllExcept(conn), self.players()),
        ]
    }

    /// Removes a connection, standing it up if it was seated.
    pub fn detach(&mut self, conn: ConnectionId) -> Outgoing {
        let Some(name) = self.members.remove(&conn) else {
            return Vec::new();
        };
        if let Some(color) = self.seats.vacate(conn) {
            tracing::info!(room_id = %self.room_id, conn_id = %conn, %color, "seat released on disconnect");
            self.refresh_ratings();
            self.reclaims.retain(|r| r.color != color);
            if !self.config.reclaim_window.is_zero() {
                self.reclaims.push(Reclaim {
                    color,
                    name,
                    at: Instant::now(),
                });
            }
        }
        vec![(Recipient::AllExcept(conn), self.players())]
    }

    // -----------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------

    pub fn rename(&mut self, conn: ConnectionId, name: String) -> Result<Outgoing, RoomError> {
        let name =
            non_empty(name).ok_or_else(|| RoomError::MalformedMessage("empty name".into()))?;
        if self.seats.rename(conn, &name).is_some() {
            self.refresh_ratings();
        }
        if let Some(entry) = self.members.get_mut(&conn) {
            *entry = name;
        }
        Ok(vec![(Recipient::All, self.players())])
    }

    /// Seats `conn` at `color`, renaming it first when `name` is given.
    pub fn sit(
        &mut self,
        conn: ConnectionId,
        color: Color,
        name: Option<String>,
    ) -> Result<Outgoing, RoomError> {
        let name = name
            .and_then(non_empty)
            .unwrap_or_else(|| self.member_name(conn));
        self.seats.sit(color, conn, name.clone())?;
        self.reclaims.retain(|r| r.color != color);
        if let Some(entry) = self.members.get_mut(&conn) {
            *entry = name;
        }
        self.refresh_ratings();
        tracing::info!(room_id = %self.room_id, conn_id = %conn, %color, "seat taken");

        Ok(vec![
            (Recipient::Connection(conn), ServerMessage::Seat { color: Some(color) }),
            (Recipient::All, self.players()),
        ])
    }

    pub fn stand_up(&mut self, conn: ConnectionId) -> Result<Outgoing, RoomError> {
        let color = self.seats.vacate(conn).ok_or(RoomError::NotSeated)?;
        self.refresh_ratings();
        tracing::info!(room_id = %self.room_id, conn_id = %conn, %color, "seat released");

        Ok(vec![
            (Recipient::Connection(conn), ServerMessage::Seat { color: None }),
            (Recipient::All, self.players()),
        ])
    }

    /// Puts a bot in an empty seat. The actor schedules its move.
    pub fn invite_bot(&mut self, color: Color, bot: &str) -> Result<Outgoing, RoomError> {
        if !self.bots.iter().any(|name| name == bot) {
            return Err(RoomError::UnknownBot(bot.to_string()));
        }
        self.seats.seat_bot(color, bot.to_string())?;
        self.reclaims.retain(|r| r.color != color);
        self.refresh_ratings();
        tracing::info!(room_id = %self.room_id, %color, bot, "bot seated");

        Ok(vec![(Recipient::All, self.players())])
    }

    /// Places a disc for `color` on behalf of `identity`.
    ///
    /// Coordinates are signed; anything off the board is an illegal move.
    pub fn submit_move(
        &mut self,
        identity: &Identity,
        color: Color,
        x: i64,
        y: i64,
    ) -> Result<Outgoing, RoomError> {
        if self.snapshot.current.color() != Some(color) {
            return Err(RoomError::NotYourTurn);
        }
        if !self
            .seats
            .occupant(color)
            .is_some_and(|occupant| occupant.acts_for(identity))
        {
            return Err(RoomError::NotYourTurn);
        }
        let at = Position::new(x, y).map_err(|_| RoomError::IllegalMove { x, y })?;
        let applied = apply_move(&self.snapshot.board, at, color)
            .map_err(|_| RoomError::IllegalMove { x, y })?;

        self.snapshot = Snapshot {
            board: applied.board,
            current: next_turn(&applied.board, color),
            last: Some(at),
        };
        self.history.push(HistoryEntry {
            snapshot: self.snapshot.clone(),
            played: Some(MoveRecord {
                color,
                x: at.x(),
                y: at.y(),
                captures: applied.captured,
            }),
        });
        self.version += 1;

        if self.snapshot.current.is_over() {
            self.finish_game();
        }
        Ok(vec![(Recipient::All, self.update())])
    }

    /// Back to the starting position. Seats and ratings stay.
    pub fn restart(&mut self, conn: ConnectionId) -> Result<Outgoing, RoomError> {
        if self.seats.color_of(conn).is_none() {
            return Err(RoomError::NotSeated);
        }
        self.resume_from(vec![Snapshot::initial()]);
        tracing::info!(room_id = %self.room_id, conn_id = %conn, "game restarted");
        Ok(vec![(Recipient::All, self.update())])
    }

    /// Resumes from a client-held save.
    ///
    /// The save is trusted: cell values and turn were checked when the
    /// message decoded, but the position is not replayed. The side to move
    /// is normalised so a loaded game cannot stall on a side with no move.
    pub fn load_snapshot(
        &mut self,
        conn: ConnectionId,
        saved: SavedGame,
    ) -> Result<Outgoing, RoomError> {
        if self.seats.color_of(conn).is_none() {
            return Err(RoomError::NotSeated);
        }
        let mut snapshots = saved
            .into_snapshots()
            .map_err(|err| RoomError::MalformedMessage(err.to_string()))?;
        if let Some(current) = snapshots.last_mut() {
            if let Some(mover) = current.current.color() {
                current.current = next_turn(&current.board, mover.opponent());
            }
        }
        self.resume_from(snapshots);
        tracing::info!(
            room_id = %self.room_id,
            conn_id = %conn,
            entries = self.history.len(),
            "game loaded"
        );
        Ok(vec![(Recipient::All, self.update())])
    }

    pub fn chat(
        &mut self,
        conn: ConnectionId,
        name: Option<String>,
        text: String,
    ) -> Result<Outgoing, RoomError> {
        if text.trim().is_empty() {
            return Err(RoomError::MalformedMessage("empty chat message".into()));
        }
        let author = name
            .and_then(non_empty)
            .unwrap_or_else(|| self.member_name(conn));
        self.chat_seq += 1;
        let line = ChatLine {
            author,
            text,
            seq: self.chat_seq,
        };
        self.chat.push_back(line.clone());
        while self.chat.len() > self.config.chat_log_len {
            self.chat.pop_front();
        }

        Ok(vec![(
            Recipient::All,
            ServerMessage::Chat {
                author: line.author,
                text: line.text,
                seq: line.seq,
            },
        )])
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    /// Replaces the game with `snapshots`, resuming from the last one.
    fn resume_from(&mut self, snapshots: Vec<Snapshot>) {
        let Some(current) = snapshots.last().cloned() else {
            return;
        };
        self.history = snapshots.into_iter().map(HistoryEntry::start).collect();
        self.recorded = current.current.is_over();
        self.snapshot = current;
        self.version += 1;
    }

    fn reclaim_seat(&mut self, conn: ConnectionId, name: &str) {
        let window = self.config.reclaim_window;
        self.reclaims.retain(|r| r.at.elapsed() < window);
        let Some(index) = self.reclaims.iter().position(|r| r.name == name) else {
            return;
        };
        let Reclaim { color, name, .. } = self.reclaims.remove(index);
        if self.seats.sit(color, conn, name).is_ok() {
            tracing::info!(room_id = %self.room_id, conn_id = %conn, %color, "seat reclaimed");
            self.refresh_ratings();
        }
    }

    fn finish_game(&mut self) {
        let final_score = score(&self.snapshot.board);
        tracing::info!(
            room_id = %self.room_id,
            black = final_score.black,
            white = final_score.white,
            "game finished"
        );
        if self.recorded {
            return;
        }
        let (Some(black), Some(white)) = (
            self.seats.occupant(Color::Black),
            self.seats.occupant(Color::White),
        ) else {
            return;
        };
        self.rating_service
            .record_game(black.name(), white.name(), final_score);
        self.recorded = true;
        self.refresh_ratings();
    }

    fn refresh_ratings(&mut self) {
        for color in Color::ALL {
            let rating = self
                .seats
                .occupant(color)
                .map(|occupant| self.rating_service.rating(occupant.name()));
            self.ratings.set(color, rating);
        }
    }

    fn member_name(&self, conn: ConnectionId) -> String {
        self.members
            .get(&conn)
            .cloned()
            .unwrap_or_else(|| self.config.default_name.clone())
    }

    fn init_for(&self, conn: ConnectionId) -> ServerMessage {
        ServerMessage::Init {
            color: self.seats.color_of(conn),
            board: self.snapshot.board,
            current: self.snapshot.current,
            players: self.seats.roster(),
            ratings: self.ratings,
            spectators: self.spectators(),
            last: self.snapshot.last,
            bots: self.bots.clone(),
            chat: self.chat.iter().cloned().collect(),
        }
    }

    fn update(&self) -> ServerMessage {
        ServerMessage::Update {
            board: self.snapshot.board,
            current: self.snapshot.current,
            players: self.seats.roster(),
            ratings: self.ratings,
            spectators: self.spectators(),
            last: self.snapshot.last,
        }
    }

    fn players(&self) -> ServerMessage {
        ServerMessage::Players {
            current: self.snapshot.current,
            players: self.seats.roster(),
            ratings: self.ratings,
            spectators: self.spectators(),
        }
    }
}

fn non_empty(name: String) -> Option<String> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use othello_engine::{Board, Score};

    use super::*;

    /// Everyone starts at 1500 and gains 10 per recorded game.
    #[derive(Default)]
    struct Ledger {
        games: Mutex<Vec<(String, String, Score)>>,
    }

    impl RatingService for Ledger {
        fn rating(&self, _name: &str) -> i32 {
            1500 + 10 * self.games.lock().unwrap().len() as i32
        }

        fn record_game(&self, black: &str, white: &str, score: Score) {
            self.games
                .lock()
                .unwrap()
                .push((black.into(), white.into(), score));
        }
    }

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    fn pos(x: i64, y: i64) -> Position {
        Position::new(x, y).unwrap()
    }

    fn room() -> (RoomState, Arc<Ledger>) {
        room_with(RoomConfig::default())
    }

    fn room_with(config: RoomConfig) -> (RoomState, Arc<Ledger>) {
        let ledger = Arc::new(Ledger::default());
        let state = RoomState::new(
            RoomId::new("7"),
            config,
            vec!["David".into(), "Roger".into()],
            ledger.clone(),
        );
        (state, ledger)
    }

    /// Ann (1) at WHITE, Bo (2) at BLACK.
    fn seated_room() -> (RoomState, Arc<Ledger>) {
        let (mut state, ledger) = room();
        state.attach(conn(1), Some("Ann".into()));
        state.attach(conn(2), Some("Bo".into()));
        state.sit(conn(1), Color::White, None).unwrap();
        state.sit(conn(2), Color::Black, None).unwrap();
        (state, ledger)
    }

    /// WHITE at (0,0), BLACK at (1,0). WHITE's only move (2,0) ends the game.
    fn one_move_left() -> Snapshot {
        let mut board = Board::empty();
        board.set(pos(0, 0), Some(Color::White));
        board.set(pos(1, 0), Some(Color::Black));
        Snapshot {
            board,
            current: Turn::White,
            last: None,
        }
    }

    // =====================================================================
    // Connections
    // =====================================================================

    #[test]
    fn test_attach_sends_init_then_players_to_others() {
        let (mut state, _) = room();
        state.attach(conn(1), Some("Ann".into()));
        let out = state.attach(conn(2), None);

        assert_eq!(out.len(), 2);
        let (to, init) = &out[0];
        assert_eq!(*to, Recipient::Connection(conn(2)));
        let ServerMessage::Init {
            color,
            current,
            spectators,
            bots,
            ..
        } = init
        else {
            panic!("expected init, got {init:?}");
        };
        assert_eq!(*color, None);
        assert_eq!(*current, Turn::White);
        assert_eq!(spectators, &vec!["Ann".to_string(), "Guest".to_string()]);
        assert_eq!(bots, &vec!["David".to_string(), "Roger".to_string()]);
        assert_eq!(out[1].0, Recipient::AllExcept(conn(2)));
        assert!(matches!(out[1].1, ServerMessage::Players { .. }));
    }

    #[test]
    fn test_detach_seated_connection_stands_up() {
        let (mut state, _) = seated_room();
        let out = state.detach(conn(1));
        assert_eq!(out.len(), 1);
        assert!(state.seats().occupant(Color::White).is_none());
        assert_eq!(state.ratings().white, None);
        assert_eq!(state.connection_count(), 1);
        assert_eq!(state.phase(), RoomPhase::Waiting);
    }

    #[test]
    fn test_detach_unknown_connection_is_silent() {
        let (mut state, _) = room();
        assert!(state.detach(conn(9)).is_empty());
    }

    fn init_color(out: &Outgoing) -> Option<Color> {
        match &out[0].1 {
            ServerMessage::Init { color, .. } => *color,
            other => panic!("expected init, got {other:?}"),
        }
    }

    #[test]
    fn test_attach_same_name_reclaims_seat_freed_by_disconnect() {
        let (mut state, _) = seated_room();
        state.detach(conn(1));

        let out = state.attach(conn(3), Some("Ann".into()));
        assert_eq!(init_color(&out), Some(Color::White));
        assert_eq!(state.seats().color_of(conn(3)), Some(Color::White));
        assert_eq!(state.ratings().white, Some(1500));
        let ServerMessage::Players { players, .. } = &out[1].1 else {
            panic!("expected players, got {:?}", out[1].1);
        };
        assert_eq!(players.white.as_deref(), Some("Ann"));

        // A second connection under the same name stays a spectator.
        assert_eq!(init_color(&state.attach(conn(4), Some("Ann".into()))), None);
        assert_eq!(state.seats().color_of(conn(3)), Some(Color::White));
    }

    #[test]
    fn test_attach_other_or_default_name_does_not_reclaim() {
        let (mut state, _) = seated_room();
        state.detach(conn(1));
        assert_eq!(init_color(&state.attach(conn(3), Some("Cy".into()))), None);
        assert_eq!(init_color(&state.attach(conn(4), None)), None);
        assert!(state.seats().occupant(Color::White).is_none());
    }

    #[test]
    fn test_reclaim_dropped_once_seat_is_taken() {
        let (mut state, _) = seated_room();
        state.detach(conn(1));
        state.attach(conn(3), Some("Cy".into()));
        state.sit(conn(3), Color::White, None).unwrap();
        state.stand_up(conn(3)).unwrap();

        assert_eq!(init_color(&state.attach(conn(4), Some("Ann".into()))), None);
    }

    #[test]
    fn test_stand_up_before_leaving_is_not_reclaimable() {
        let (mut state, _) = seated_room();
        state.stand_up(conn(1)).unwrap();
        state.detach(conn(1));
        assert_eq!(init_color(&state.attach(conn(3), Some("Ann".into()))), None);
    }

    #[test]
    fn test_zero_reclaim_window_never_reclaims() {
        let (mut state, _) = room_with(RoomConfig {
            reclaim_window: std::time::Duration::ZERO,
            ..RoomConfig::default()
        });
        state.attach(conn(1), Some("Ann".into()));
        state.sit(conn(1), Color::White, None).unwrap();
        state.detach(conn(1));
        assert_eq!(init_color(&state.attach(conn(2), Some("Ann".into()))), None);
    }

    // =====================================================================
    // Seats
    // =====================================================================

    #[test]
    fn test_sit_sends_seat_to_sitter_and_roster_to_all() {
        let (mut state, _) = room();
        state.attach(conn(1), None);
        let out = state.sit(conn(1), Color::Black, Some("Ann".into())).unwrap();
        assert_eq!(
            out[0],
            (
                Recipient::Connection(conn(1)),
                ServerMessage::Seat {
                    color: Some(Color::Black)
                }
            )
        );
        assert_eq!(out[1].0, Recipient::All);
        assert_eq!(state.seats().roster().black.as_deref(), Some("Ann"));
        assert_eq!(state.ratings().black, Some(1500));
        assert!(state.spectators().is_empty());
    }

    #[test]
    fn test_sit_taken_seat_changes_nothing() {
        let (mut state, _) = room();
        state.attach(conn(1), Some("Ann".into()));
        state.attach(conn(2), Some("Bo".into()));
        state.sit(conn(1), Color::Black, None).unwrap();

        let err = state.sit(conn(2), Color::Black, Some("Zed".into())).unwrap_err();
        assert_eq!(err, RoomError::SeatTaken(Color::Black));
        assert_eq!(state.spectators(), vec!["Bo".to_string()]);
    }

    #[test]
    fn test_sit_other_color_is_already_seated() {
        let (mut state, _) = seated_room();
        assert_eq!(
            state.sit(conn(1), Color::Black, None),
            Err(RoomError::AlreadySeated(Color::White))
        );
    }

    #[test]
    fn test_stand_up_unseated_is_not_seated() {
        let (mut state, _) = room();
        state.attach(conn(1), None);
        assert_eq!(state.stand_up(conn(1)), Err(RoomError::NotSeated));
    }

    #[test]
    fn test_stand_up_mid_game_keeps_board() {
        let (mut state, _) = seated_room();
        state
            .submit_move(&Identity::Connection(conn(1)), Color::White, 2, 3)
            .unwrap();
        let out = state.stand_up(conn(2)).unwrap();
        assert_eq!(out[0].1, ServerMessage::Seat { color: None });
        assert_eq!(state.turn(), Turn::Black);
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.phase(), RoomPhase::Waiting);
    }

    #[test]
    fn test_rename_updates_seat_and_rejects_empty() {
        let (mut state, _) = seated_room();
        state.rename(conn(1), "  Annie ".into()).unwrap();
        assert_eq!(state.seats().roster().white.as_deref(), Some("Annie"));
        assert_eq!(
            state.rename(conn(1), "   ".into()),
            Err(RoomError::MalformedMessage("empty name".into()))
        );
    }

    // =====================================================================
    // Bots
    // =====================================================================

    #[test]
    fn test_invite_bot_to_current_side_is_bot_to_move() {
        let (mut state, _) = room();
        state.invite_bot(Color::White, "David").unwrap();
        assert_eq!(state.bot_to_move(), Some((Color::White, "David".into())));
        assert_eq!(state.ratings().white, Some(1500));
    }

    #[test]
    fn test_invite_unknown_bot_is_rejected() {
        let (mut state, _) = room();
        assert_eq!(
            state.invite_bot(Color::White, "Deep Blue"),
            Err(RoomError::UnknownBot("Deep Blue".into()))
        );
        assert!(state.seats().occupant(Color::White).is_none());
    }

    #[test]
    fn test_invite_bot_into_taken_seat_is_rejected() {
        let (mut state, _) = seated_room();
        assert_eq!(
            state.invite_bot(Color::Black, "David"),
            Err(RoomError::SeatTaken(Color::Black))
        );
    }

    #[test]
    fn test_bot_moves_only_through_its_own_identity() {
        let (mut state, _) = room();
        state.attach(conn(1), None);
        state.invite_bot(Color::White, "David").unwrap();

        assert_eq!(
            state.submit_move(&Identity::Connection(conn(1)), Color::White, 2, 3),
            Err(RoomError::NotYourTurn)
        );
        assert_eq!(
            state.submit_move(&Identity::Bot("Roger".into()), Color::White, 2, 3),
            Err(RoomError::NotYourTurn)
        );
        state
            .submit_move(&Identity::Bot("David".into()), Color::White, 2, 3)
            .unwrap();
        assert_eq!(state.bot_to_move(), None);
    }

    // =====================================================================
    // Moves
    // =====================================================================

    #[test]
    fn test_submit_move_opening_scenario() {
        let (mut state, _) = seated_room();
        assert_eq!(state.phase(), RoomPhase::InProgress);

        let out = state
            .submit_move(&Identity::Connection(conn(1)), Color::White, 2, 3)
            .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, Recipient::All);
        let board = state.snapshot().board;
        assert_eq!(board.get(pos(2, 3)), Some(Color::White));
        assert_eq!(board.get(pos(3, 3)), Some(Color::White));
        assert_eq!(score(&board), Score { black: 1, white: 4 });
        assert_eq!(state.turn(), Turn::Black);
        assert_eq!(state.snapshot().last, Some(pos(2, 3)));

        let entry = &state.history()[1];
        assert_eq!(
            entry.played,
            Some(MoveRecord {
                color: Color::White,
                x: 2,
                y: 3,
                captures: vec![pos(3, 3)],
            })
        );
        assert_eq!(state.version(), 1);
    }

    #[test]
    fn test_submit_move_wrong_color_is_not_your_turn() {
        let (mut state, _) = seated_room();
        assert_eq!(
            state.submit_move(&Identity::Connection(conn(2)), Color::Black, 2, 4),
            Err(RoomError::NotYourTurn)
        );
    }

    #[test]
    fn test_submit_move_spectator_is_not_your_turn() {
        let (mut state, _) = seated_room();
        state.attach(conn(3), None);
        assert_eq!(
            state.submit_move(&Identity::Connection(conn(3)), Color::White, 2, 3),
            Err(RoomError::NotYourTurn)
        );
    }

    #[test]
    fn test_submit_move_illegal_leaves_state_untouched() {
        let (mut state, _) = seated_room();
        let me = Identity::Connection(conn(1));
        assert_eq!(
            state.submit_move(&me, Color::White, 3, 3),
            Err(RoomError::IllegalMove { x: 3, y: 3 })
        );
        assert_eq!(
            state.submit_move(&me, Color::White, 0, 0),
            Err(RoomError::IllegalMove { x: 0, y: 0 })
        );
        assert_eq!(
            state.submit_move(&me, Color::White, -1, 9),
            Err(RoomError::IllegalMove { x: -1, y: 9 })
        );
        assert_eq!(state.snapshot(), &Snapshot::initial());
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.version(), 0);
    }

    #[test]
    fn test_finishing_move_records_result_once() {
        let (mut state, ledger) = seated_room();
        state
            .load_snapshot(conn(1), SavedGame::Single(one_move_left()))
            .unwrap();
        state
            .submit_move(&Identity::Connection(conn(1)), Color::White, 2, 0)
            .unwrap();

        assert_eq!(state.phase(), RoomPhase::Finished);
        let games = ledger.games.lock().unwrap().clone();
        assert_eq!(
            games,
            vec![("Bo".into(), "Ann".into(), Score { black: 0, white: 3 })]
        );
        assert_eq!(state.ratings().white, Some(1510));
    }

    #[test]
    fn test_finishing_with_empty_seat_records_nothing() {
        let (mut state, ledger) = seated_room();
        state
            .load_snapshot(conn(1), SavedGame::Single(one_move_left()))
            .unwrap();
        state.stand_up(conn(2)).unwrap();
        state
            .submit_move(&Identity::Connection(conn(1)), Color::White, 2, 0)
            .unwrap();
        assert_eq!(state.phase(), RoomPhase::Finished);
        assert!(ledger.games.lock().unwrap().is_empty());
    }

    // =====================================================================
    // Restart and load
    // =====================================================================

    #[test]
    fn test_restart_after_finish_keeps_seats_and_ratings() {
        let (mut state, _) = seated_room();
        state
            .load_snapshot(conn(2), SavedGame::Single(one_move_left()))
            .unwrap();
        state
            .submit_move(&Identity::Connection(conn(1)), Color::White, 2, 0)
            .unwrap();
        let roster = state.seats().roster();
        let ratings = state.ratings();

        state.restart(conn(2)).unwrap();

        assert_eq!(state.snapshot(), &Snapshot::initial());
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.seats().roster(), roster);
        assert_eq!(state.ratings(), ratings);
        assert_eq!(state.phase(), RoomPhase::InProgress);
    }

    #[test]
    fn test_restart_by_spectator_is_not_seated() {
        let (mut state, _) = seated_room();
        state.attach(conn(3), None);
        assert_eq!(state.restart(conn(3)), Err(RoomError::NotSeated));
    }

    #[test]
    fn test_load_history_resumes_from_last_entry() {
        let (mut state, _) = seated_room();
        let saved = SavedGame::History {
            history: vec![Snapshot::initial(), one_move_left()],
        };
        state.load_snapshot(conn(1), saved).unwrap();
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.snapshot(), &one_move_left());
        assert!(state.history().iter().all(|entry| entry.played.is_none()));
    }

    #[test]
    fn test_load_normalises_side_without_moves() {
        let (mut state, _) = seated_room();
        let mut stuck = one_move_left();
        stuck.current = Turn::Black;
        state.load_snapshot(conn(1), SavedGame::Single(stuck)).unwrap();
        assert_eq!(state.turn(), Turn::White);
    }

    #[test]
    fn test_load_rejections() {
        let (mut state, _) = seated_room();
        state.attach(conn(3), None);
        assert_eq!(
            state.load_snapshot(conn(3), SavedGame::Single(one_move_left())),
            Err(RoomError::NotSeated)
        );
        assert!(matches!(
            state.load_snapshot(conn(1), SavedGame::History { history: vec![] }),
            Err(RoomError::MalformedMessage(_))
        ));
        assert_eq!(state.snapshot(), &Snapshot::initial());
    }

    // =====================================================================
    // Chat and summary
    // =====================================================================

    #[test]
    fn test_chat_numbers_lines_and_bounds_log() {
        let config = RoomConfig {
            chat_log_len: 2,
            ..RoomConfig::default()
        };
        let (mut state, _) = room_with(config);
        state.attach(conn(1), Some("Ann".into()));
        for text in ["one", "two", "three"] {
            state.chat(conn(1), None, text.into()).unwrap();
        }
        let out = state.chat(conn(1), Some("Alias".into()), "four".into()).unwrap();
        assert_eq!(
            out[0].1,
            ServerMessage::Chat {
                author: "Alias".into(),
                text: "four".into(),
                seq: 4
            }
        );

        let init = state.attach(conn(2), None);
        let ServerMessage::Init { chat, .. } = &init[0].1 else {
            panic!("expected init");
        };
        let seqs: Vec<u64> = chat.iter().map(|line| line.seq).collect();
        assert_eq!(seqs, vec![3, 4]);
    }

    #[test]
    fn test_chat_empty_text_is_malformed() {
        let (mut state, _) = room();
        state.attach(conn(1), None);
        assert!(matches!(
            state.chat(conn(1), None, "  ".into()),
            Err(RoomError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_summary_reports_roster_and_phase() {
        let (state, _) = seated_room();
        let summary = state.summary();
        assert_eq!(summary.name, "Game 7");
        assert_eq!(summary.players.white.as_deref(), Some("Ann"));
        assert_eq!(summary.phase, RoomPhase::InProgress);
        assert_eq!(summary.connections, 2);
    }
}
