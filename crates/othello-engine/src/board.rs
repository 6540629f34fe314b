//! Board value types: colors, turns, positions and the 8×8 grid.
//!
//! All of these travel on the wire, so each carries serde attributes that
//! pin its JSON shape:
//!
//! | type       | JSON                                   |
//! |------------|----------------------------------------|
//! | `Color`    | `"black"` / `"white"`                  |
//! | `Turn`     | `1` (black), `-1` (white), `0` (over)  |
//! | `Position` | `[x, y]`                               |
//! | `Board`    | `board[x][y]` of `1` / `-1` / `0`      |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Width and height of the board.
pub const BOARD_SIZE: usize = 8;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// A disc color, and equally the seat that plays it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// Both colors, black first.
    pub const ALL: [Color; 2] = [Color::Black, Color::White];

    /// Returns the other color.
    pub fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }

    /// Wire value of a disc of this color.
    pub fn disc(self) -> i8 {
        match self {
            Self::Black => 1,
            Self::White => -1,
        }
    }

    /// Parses a wire cell value. `0` is an empty cell.
    pub fn from_disc(value: i8) -> Result<Option<Self>, EngineError> {
        match value {
            1 => Ok(Some(Self::Black)),
            -1 => Ok(Some(Self::White)),
            0 => Ok(None),
            other => Err(EngineError::InvalidCell(other)),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Black => write!(f, "black"),
            Self::White => write!(f, "white"),
        }
    }
}

// ---------------------------------------------------------------------------
// Turn
// ---------------------------------------------------------------------------

/// Whose move it is. `GameOver` is terminal: neither side can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Turn {
    Black,
    White,
    GameOver,
}

impl Turn {
    /// The color to move, or `None` once the game is over.
    pub fn color(self) -> Option<Color> {
        match self {
            Self::Black => Some(Color::Black),
            Self::White => Some(Color::White),
            Self::GameOver => None,
        }
    }

    /// Returns `true` if the game has ended.
    pub fn is_over(self) -> bool {
        matches!(self, Self::GameOver)
    }
}

impl From<Color> for Turn {
    fn from(color: Color) -> Self {
        match color {
            Color::Black => Self::Black,
            Color::White => Self::White,
        }
    }
}

impl From<Turn> for i8 {
    fn from(turn: Turn) -> Self {
        turn.color().map_or(0, Color::disc)
    }
}

impl TryFrom<i8> for Turn {
    type Error = EngineError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Black),
            -1 => Ok(Self::White),
            0 => Ok(Self::GameOver),
            other => Err(EngineError::InvalidTurn(other)),
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.color() {
            Some(color) => color.fmt(f),
            None => write!(f, "game over"),
        }
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A cell coordinate, guaranteed to be on the board.
///
/// Ordering is by `x`, then `y`, which is also the engine's scan order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(into = "(usize, usize)", try_from = "(i64, i64)")]
pub struct Position {
    x: u8,
    y: u8,
}

impl Position {
    /// Creates a position, rejecting coordinates off the board.
    pub fn new(x: i64, y: i64) -> Result<Self, EngineError> {
        let size = BOARD_SIZE as i64;
        if (0..size).contains(&x) && (0..size).contains(&y) {
            Ok(Self {
                x: x as u8,
                y: y as u8,
            })
        } else {
            Err(EngineError::OutOfBounds { x, y })
        }
    }

    pub fn x(self) -> usize {
        usize::from(self.x)
    }

    pub fn y(self) -> usize {
        usize::from(self.y)
    }

    /// Moves one cell in direction `(dx, dy)`, or `None` at the edge.
    pub fn step(self, dx: i8, dy: i8) -> Option<Self> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        let size = BOARD_SIZE as u8;
        (x < size && y < size).then_some(Self { x, y })
    }

    /// Every cell on the board in scan order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..BOARD_SIZE as u8)
            .flat_map(|x| (0..BOARD_SIZE as u8).map(move |y| Self { x, y }))
    }

    /// Returns `true` for the four corner cells.
    pub fn is_corner(self) -> bool {
        let edge = BOARD_SIZE as u8 - 1;
        (self.x == 0 || self.x == edge) && (self.y == 0 || self.y == edge)
    }

    /// Returns `true` for cells on the outer ring (corners included).
    pub fn is_edge(self) -> bool {
        let edge = BOARD_SIZE as u8 - 1;
        self.x == 0 || self.y == 0 || self.x == edge || self.y == edge
    }
}

impl From<Position> for (usize, usize) {
    fn from(pos: Position) -> Self {
        (pos.x(), pos.y())
    }
}

impl TryFrom<(i64, i64)> for Position {
    type Error = EngineError;

    fn try_from((x, y): (i64, i64)) -> Result<Self, Self::Error> {
        Self::new(x, y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Wire form of a board: `cells[x][y]`.
type WireBoard = [[i8; BOARD_SIZE]; BOARD_SIZE];

/// An 8×8 grid of cells, each empty or holding a disc.
///
/// `Board` is a small `Copy` value. Rules never mutate a board in place on
/// behalf of a caller; [`apply_move`](crate::apply_move) returns a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "WireBoard", try_from = "WireBoard")]
pub struct Board {
    cells: [[Option<Color>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// A board with no discs.
    pub fn empty() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// The starting position.
    pub fn initial() -> Self {
        let mid = BOARD_SIZE / 2;
        let mut board = Self::empty();
        board.cells[mid - 1][mid - 1] = Some(Color::Black);
        board.cells[mid][mid] = Some(Color::Black);
        board.cells[mid - 1][mid] = Some(Color::White);
        board.cells[mid][mid - 1] = Some(Color::White);
        board
    }

    /// The disc at `at`, if any.
    pub fn get(&self, at: Position) -> Option<Color> {
        self.cells[at.x()][at.y()]
    }

    /// Overwrites a single cell.
    pub fn set(&mut self, at: Position, cell: Option<Color>) {
        self.cells[at.x()][at.y()] = cell;
    }

    /// Number of discs of `color`.
    pub fn count(&self, color: Color) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| **cell == Some(color))
            .count()
    }

    /// Number of empty cells.
    pub fn empty_count(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_none()).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl From<Board> for WireBoard {
    fn from(board: Board) -> Self {
        board
            .cells
            .map(|column| column.map(|cell| cell.map_or(0, Color::disc)))
    }
}

impl TryFrom<WireBoard> for Board {
    type Error = EngineError;

    fn try_from(wire: WireBoard) -> Result<Self, Self::Error> {
        let mut board = Self::empty();
        for (x, column) in wire.iter().enumerate() {
            for (y, value) in column.iter().enumerate() {
                board.cells[x][y] = Color::from_disc(*value)?;
            }
        }
        Ok(board)
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Disc counts for both colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub black: usize,
    pub white: usize,
}

impl Score {
    /// The color with more discs, or `None` for a draw.
    pub fn winner(&self) -> Option<Color> {
        match self.black.cmp(&self.white) {
            std::cmp::Ordering::Greater => Some(Color::Black),
            std::cmp::Ordering::Less => Some(Color::White),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Disc count for one color.
    pub fn of(&self, color: Color) -> usize {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }
}
