//! Move legality, capture computation and turn progression.

use crate::{Board, Color, EngineError, Position, Score, Turn};

/// The eight compass directions as `(dx, dy)`.
const DIRECTIONS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Result of a successful [`apply_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub board: Board,
    /// Cells flipped to the mover's color, in direction order.
    pub captured: Vec<Position>,
}

/// Discs `color` would flip by placing at `at`.
///
/// Each direction is scanned independently: a run of opposing discs counts
/// only if it ends on a disc of `color`. The result is the union over all
/// directions. Occupancy of `at` itself is not checked.
pub fn captures(board: &Board, at: Position, color: Color) -> Vec<Position> {
    let opponent = color.opponent();
    let mut flipped = Vec::new();

    for (dx, dy) in DIRECTIONS {
        let mut run = Vec::new();
        let mut cursor = at.step(dx, dy);
        while let Some(pos) = cursor {
            match board.get(pos) {
                Some(c) if c == opponent => run.push(pos),
                Some(_) => {
                    flipped.extend_from_slice(&run);
                    break;
                }
                None => break,
            }
            cursor = pos.step(dx, dy);
        }
    }

    flipped
}

fn is_legal(board: &Board, at: Position, color: Color) -> bool {
    board.get(at).is_none() && !captures(board, at, color).is_empty()
}

/// Every legal placement for `color`, in scan order.
pub fn legal_moves(board: &Board, color: Color) -> Vec<Position> {
    Position::all()
        .filter(|pos| is_legal(board, *pos, color))
        .collect()
}

/// Returns `true` if `color` has at least one legal placement.
pub fn has_legal_move(board: &Board, color: Color) -> bool {
    Position::all().any(|pos| is_legal(board, pos, color))
}

/// Places a disc of `color` at `at` and flips every captured disc.
///
/// The input board is left untouched.
pub fn apply_move(board: &Board, at: Position, color: Color) -> Result<AppliedMove, EngineError> {
    if board.get(at).is_some() {
        return Err(EngineError::IllegalMove { at, color });
    }
    let captured = captures(board, at, color);
    if captured.is_empty() {
        return Err(EngineError::IllegalMove { at, color });
    }

    let mut next = *board;
    next.set(at, Some(color));
    for pos in &captured {
        next.set(*pos, Some(color));
    }
    Ok(AppliedMove {
        board: next,
        captured,
    })
}

/// Whose turn follows a move by `mover`.
///
/// The opponent moves if it can; otherwise the mover goes again if it can;
/// otherwise the game is over.
pub fn next_turn(board: &Board, mover: Color) -> Turn {
    let opponent = mover.opponent();
    if has_legal_move(board, opponent) {
        Turn::from(opponent)
    } else if has_legal_move(board, mover) {
        Turn::from(mover)
    } else {
        Turn::GameOver
    }
}

/// Disc counts for both colors.
pub fn score(board: &Board) -> Score {
    Score {
        black: board.count(Color::Black),
        white: board.count(Color::White),
    }
}
