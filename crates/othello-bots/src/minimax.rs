use othello_engine::{BOARD_SIZE, Board, Color, Position, apply_move, has_legal_move, legal_moves};

use crate::Strategy;

/// Square values indexed `[x][y]`. Corners are prized and the cells next
/// to them penalised.
const WEIGHTS: [[i32; BOARD_SIZE]; BOARD_SIZE] = [
    [100, -20, 10, 5, 5, 10, -20, 100],
    [-20, -50, -2, -2, -2, -2, -50, -20],
    [10, -2, -1, -1, -1, -1, -2, 10],
    [5, -2, -1, -1, -1, -1, -2, 5],
    [5, -2, -1, -1, -1, -1, -2, 5],
    [10, -2, -1, -1, -1, -1, -2, 10],
    [-20, -50, -2, -2, -2, -2, -50, -20],
    [100, -20, 10, 5, 5, 10, -20, 100],
];

/// Plain minimax over the positional weight table.
#[derive(Debug, Clone, Copy)]
pub struct Minimax {
    depth: u8,
}

impl Minimax {
    pub fn new(depth: u8) -> Self {
        Self {
            depth: depth.max(1),
        }
    }

    fn evaluate(board: &Board, me: Color) -> i32 {
        Position::all()
            .filter_map(|p| {
                board.get(p).map(|c| {
                    let weight = WEIGHTS[p.x()][p.y()];
                    if c == me { weight } else { -weight }
                })
            })
            .sum()
    }

    fn search(&self, board: &Board, turn: Color, depth: u8, me: Color) -> i32 {
        if depth == 0 {
            return Self::evaluate(board, me);
        }
        let moves = legal_moves(board, turn);
        if moves.is_empty() {
            return if has_legal_move(board, turn.opponent()) {
                self.search(board, turn.opponent(), depth - 1, me)
            } else {
                Self::evaluate(board, me)
            };
        }

        let values = moves.into_iter().filter_map(|at| {
            apply_move(board, at, turn)
                .ok()
                .map(|applied| self.search(&applied.board, turn.opponent(), depth - 1, me))
        });
        if turn == me {
            values.max().unwrap_or(i32::MIN)
        } else {
            values.min().unwrap_or(i32::MAX)
        }
    }
}

impl Default for Minimax {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Strategy for Minimax {
    fn choose(&self, board: &Board, color: Color) -> Option<Position> {
        let mut best: Option<(Position, i32)> = None;
        for at in legal_moves(board, color) {
            let Ok(applied) = apply_move(board, at, color) else {
                continue;
            };
            let value = self.search(&applied.board, color.opponent(), self.depth - 1, color);
            if best.is_none_or(|(_, top)| value > top) {
                best = Some((at, value));
            }
        }
        best.map(|(at, _)| at)
    }
}
