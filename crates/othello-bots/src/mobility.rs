use othello_engine::{Board, Color, Position, apply_move, legal_moves};

use crate::Strategy;

/// Leaves the opponent with as few replies as possible.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mobility;

impl Strategy for Mobility {
    fn choose(&self, board: &Board, color: Color) -> Option<Position> {
        let mut best: Option<(Position, usize)> = None;
        for at in legal_moves(board, color) {
            let Ok(applied) = apply_move(board, at, color) else {
                continue;
            };
            let replies = legal_moves(&applied.board, color.opponent()).len();
            if best.is_none_or(|(_, fewest)| replies < fewest) {
                best = Some((at, replies));
            }
        }
        best.map(|(at, _)| at)
    }
}
