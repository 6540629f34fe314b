use othello_engine::{Board, Color, Position, captures, legal_moves};

use crate::Strategy;

/// Takes the move that flips the most discs. Ties go to the first move in
/// scan order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl Strategy for Greedy {
    fn choose(&self, board: &Board, color: Color) -> Option<Position> {
        let mut best: Option<(Position, usize)> = None;
        for at in legal_moves(board, color) {
            let flips = captures(board, at, color).len();
            if best.is_none_or(|(_, most)| flips > most) {
                best = Some((at, flips));
            }
        }
        best.map(|(at, _)| at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: i64, y: i64) -> Position {
        Position::new(x, y).unwrap()
    }

    #[test]
    fn test_choose_prefers_larger_capture() {
        let mut board = Board::empty();
        // (0,0) flips two discs eastwards; (0,5) flips one.
        board.set(pos(1, 0), Some(Color::Black));
        board.set(pos(2, 0), Some(Color::Black));
        board.set(pos(3, 0), Some(Color::White));
        board.set(pos(0, 4), Some(Color::Black));
        board.set(pos(0, 3), Some(Color::White));
        assert_eq!(Greedy.choose(&board, Color::White), Some(pos(0, 0)));
    }

    #[test]
    fn test_choose_ties_resolve_in_scan_order() {
        assert_eq!(Greedy.choose(&Board::initial(), Color::White), Some(pos(2, 3)));
    }

    #[test]
    fn test_choose_without_moves_is_none() {
        assert_eq!(Greedy.choose(&Board::empty(), Color::Black), None);
    }
}
