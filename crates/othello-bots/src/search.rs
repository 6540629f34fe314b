//! Alpha-beta search with iterative deepening.
//!
//! The search is negamax: every score is from the point of view of the side
//! to move at that node. A transposition table keyed by
//! `(board, side to move, remaining depth)` is shared across the deepening
//! iterations of one `choose` call. Once few enough cells are empty the
//! search runs to the end of the game and terminal positions score by final
//! disc difference.

use std::collections::HashMap;

use othello_engine::{
    Board, Color, Position, apply_move, captures, has_legal_move, legal_moves,
};

use crate::Strategy;

/// Bound on every score; keeps negation away from `i32::MIN`.
const INFINITY: i32 = 1_000_000_000;

/// Added to the disc difference of a finished game so any win outranks any
/// heuristic score.
const WIN_SCORE: i32 = 100_000;

/// At or below this many empties the search is exact.
const ENDGAME_EMPTIES: usize = 12;

/// Cells diagonally or orthogonally next to a corner.
const BAD_SQUARES: [(usize, usize); 12] = [
    (0, 1),
    (1, 0),
    (1, 1),
    (0, 6),
    (1, 7),
    (1, 6),
    (6, 0),
    (7, 1),
    (6, 1),
    (6, 6),
    (6, 7),
    (7, 6),
];

/// Replies to the initial position.
const OPENING_BOOK: [(i64, i64); 2] = [(2, 3), (2, 4)];

fn is_bad_square(at: Position) -> bool {
    BAD_SQUARES.contains(&(at.x(), at.y()))
}

/// Per-phase evaluation weights.
struct Weights {
    discs: i32,
    mobility: i32,
    corners: i32,
    edges: i32,
    bad: i32,
}

impl Weights {
    fn for_discs(discs: usize) -> Self {
        match discs {
            0..=20 => Self {
                discs: 10,
                mobility: 80,
                corners: 800,
                edges: 40,
                bad: 60,
            },
            21..=52 => Self {
                discs: 30,
                mobility: 60,
                corners: 800,
                edges: 60,
                bad: 40,
            },
            _ => Self {
                discs: 100,
                mobility: 20,
                corners: 800,
                edges: 20,
                bad: 0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: i32,
    bound: Bound,
}

type TranspositionTable = HashMap<(Board, Color, u8), Entry>;

/// Alpha-beta player with a depth limit.
#[derive(Debug, Clone, Copy)]
pub struct AlphaBeta {
    max_depth: u8,
}

impl AlphaBeta {
    pub fn new(max_depth: u8) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }
}

impl Strategy for AlphaBeta {
    fn choose(&self, board: &Board, color: Color) -> Option<Position> {
        let moves = legal_moves(board, color);
        let first = *moves.first()?;
        if moves.len() == 1 {
            return Some(first);
        }

        if *board == Board::initial() {
            let book = OPENING_BOOK
                .iter()
                .filter_map(|(x, y)| Position::new(*x, *y).ok())
                .find(|at| moves.contains(at));
            if book.is_some() {
                return book;
            }
        }

        let empties = board.empty_count();
        let depth_limit = if empties <= ENDGAME_EMPTIES {
            u8::try_from(empties).unwrap_or(self.max_depth)
        } else {
            self.max_depth
        };

        let mut table = TranspositionTable::new();
        let mut ordered = order_moves(board, moves, color);
        let mut best = first;
        for depth in 1..=depth_limit {
            let mut best_value = -INFINITY;
            let mut alpha = -INFINITY;
            for at in &ordered {
                let Ok(applied) = apply_move(board, *at, color) else {
                    continue;
                };
                let value =
                    -negamax(&applied.board, color.opponent(), depth - 1, -INFINITY, -alpha, &mut table);
                if value > best_value {
                    best_value = value;
                    best = *at;
                }
                alpha = alpha.max(value);
            }
            // Search the previous best first on the next iteration.
            if let Some(index) = ordered.iter().position(|at| *at == best) {
                let lead = ordered.remove(index);
                ordered.insert(0, lead);
            }
        }
        Some(best)
    }
}

/// Corners first, then edges, then interior cells by flip count, and the
/// cells next to corners last.
fn order_moves(board: &Board, mut moves: Vec<Position>, color: Color) -> Vec<Position> {
    moves.sort_by_cached_key(|at| {
        if at.is_corner() {
            (0, 0)
        } else if is_bad_square(*at) {
            (3, 0)
        } else {
            let tier = if at.is_edge() { 1 } else { 2 };
            (tier, -(captures(board, *at, color).len() as i32))
        }
    });
    moves
}

fn negamax(
    board: &Board,
    turn: Color,
    depth: u8,
    mut alpha: i32,
    beta: i32,
    table: &mut TranspositionTable,
) -> i32 {
    let key = (*board, turn, depth);
    if let Some(entry) = table.get(&key) {
        match entry.bound {
            Bound::Exact => return entry.value,
            Bound::Lower if entry.value >= beta => return entry.value,
            Bound::Upper if entry.value <= alpha => return entry.value,
            _ => {}
        }
    }

    let original_alpha = alpha;
    let moves = legal_moves(board, turn);
    let value = if moves.is_empty() {
        if !has_legal_move(board, turn.opponent()) {
            final_score(board, turn)
        } else if depth == 0 {
            evaluate(board, turn)
        } else {
            -negamax(board, turn.opponent(), depth - 1, -beta, -alpha, table)
        }
    } else if depth == 0 {
        evaluate(board, turn)
    } else {
        let mut best = -INFINITY;
        for at in order_moves(board, moves, turn) {
            let Ok(applied) = apply_move(board, at, turn) else {
                continue;
            };
            let value = -negamax(&applied.board, turn.opponent(), depth - 1, -beta, -alpha, table);
            best = best.max(value);
            alpha = alpha.max(value);
            if alpha >= beta {
                break;
            }
        }
        best
    };

    let bound = if value <= original_alpha {
        Bound::Upper
    } else if value >= beta {
        Bound::Lower
    } else {
        Bound::Exact
    };
    table.insert(key, Entry { value, bound });
    value
}

/// Score of a finished game for `me`.
fn final_score(board: &Board, me: Color) -> i32 {
    let diff = board.count(me) as i32 - board.count(me.opponent()) as i32;
    match diff.signum() {
        1 => WIN_SCORE + diff,
        -1 => -WIN_SCORE + diff,
        _ => 0,
    }
}

/// Heuristic value of `board` for `me`.
fn evaluate(board: &Board, me: Color) -> i32 {
    let mut discs = [0i32; 2];
    let mut corners = [0i32; 2];
    let mut edges = [0i32; 2];
    let mut bad = [0i32; 2];

    for at in Position::all() {
        let Some(owner) = board.get(at) else {
            continue;
        };
        let side = usize::from(owner != me);
        discs[side] += 1;
        if at.is_corner() {
            corners[side] += 1;
        } else if at.is_edge() {
            edges[side] += 1;
        }
        if is_bad_square(at) {
            bad[side] += 1;
        }
    }

    let mobility = legal_moves(board, me).len() as i32
        - legal_moves(board, me.opponent()).len() as i32;
    let w = Weights::for_discs((discs[0] + discs[1]) as usize);

    w.discs * (discs[0] - discs[1])
        + w.mobility * mobility
        + w.corners * (corners[0] - corners[1])
        + w.edges * (edges[0] - edges[1])
        - w.bad * (bad[0] - bad[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: i64, y: i64) -> Position {
        Position::new(x, y).unwrap()
    }

    #[test]
    fn test_choose_uses_opening_book_at_start() {
        let at = AlphaBeta::new(4).choose(&Board::initial(), Color::White);
        assert_eq!(at, Some(pos(2, 3)));
    }

    #[test]
    fn test_choose_single_legal_move_is_returned() {
        let mut board = Board::empty();
        board.set(pos(0, 1), Some(Color::Black));
        board.set(pos(0, 2), Some(Color::White));
        assert_eq!(legal_moves(&board, Color::White), vec![pos(0, 0)]);
        assert_eq!(AlphaBeta::new(6).choose(&board, Color::White), Some(pos(0, 0)));
    }

    #[test]
    fn test_choose_takes_move_that_wins_outright() {
        let mut board = Board::empty();
        board.set(pos(1, 1), Some(Color::Black));
        board.set(pos(2, 2), Some(Color::Black));
        board.set(pos(3, 3), Some(Color::White));
        board.set(pos(3, 1), Some(Color::White));
        assert_eq!(legal_moves(&board, Color::White), vec![pos(0, 0), pos(1, 3)]);
        assert_eq!(AlphaBeta::new(4).choose(&board, Color::White), Some(pos(0, 0)));
    }

    #[test]
    fn test_choose_after_opening_is_legal() {
        let board = apply_move(&Board::initial(), pos(2, 3), Color::White).unwrap().board;
        let at = AlphaBeta::new(4).choose(&board, Color::Black).unwrap();
        assert!(legal_moves(&board, Color::Black).contains(&at));
    }

    #[test]
    fn test_order_moves_puts_corners_first_and_bad_squares_last() {
        let mut board = Board::empty();
        board.set(pos(0, 1), Some(Color::Black));
        board.set(pos(0, 2), Some(Color::White));
        board.set(pos(2, 1), Some(Color::Black));
        board.set(pos(3, 1), Some(Color::White));
        let moves = legal_moves(&board, Color::White);
        assert!(moves.contains(&pos(0, 0)));
        assert!(moves.contains(&pos(1, 1)));
        let ordered = order_moves(&board, moves, Color::White);
        assert_eq!(ordered.first(), Some(&pos(0, 0)));
        assert_eq!(ordered.last(), Some(&pos(1, 1)));
    }

    #[test]
    fn test_final_score_prefers_any_win() {
        let mut board = Board::empty();
        board.set(pos(0, 0), Some(Color::Black));
        assert!(final_score(&board, Color::Black) > WIN_SCORE);
        assert!(final_score(&board, Color::White) < -WIN_SCORE + 1);
    }

    #[test]
    fn test_evaluate_is_antisymmetric() {
        let board = apply_move(&Board::initial(), pos(2, 3), Color::White).unwrap().board;
        assert_eq!(evaluate(&board, Color::Black), -evaluate(&board, Color::White));
    }
}
