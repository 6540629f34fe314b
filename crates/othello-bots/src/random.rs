use std::sync::Mutex;

use othello_engine::{Board, Color, Position, legal_moves};
use rand::prelude::*;

use crate::Strategy;

/// Plays a uniformly random legal move.
///
/// Seeded instances are deterministic, which keeps tests reproducible.
pub struct RandomMover {
    rng: Mutex<StdRng>,
}

impl RandomMover {
    /// `None` seeds from the operating system.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl Strategy for RandomMover {
    fn choose(&self, board: &Board, color: Color) -> Option<Position> {
        let moves = legal_moves(board, color);
        // A poisoned RNG is still a usable RNG.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        moves.choose(&mut *rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_returns_a_legal_move() {
        let mover = RandomMover::new(Some(7));
        let board = Board::initial();
        let legal = legal_moves(&board, Color::White);
        for _ in 0..20 {
            let at = mover.choose(&board, Color::White).unwrap();
            assert!(legal.contains(&at));
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = RandomMover::new(Some(42));
        let b = RandomMover::new(Some(42));
        let board = Board::initial();
        for _ in 0..10 {
            assert_eq!(a.choose(&board, Color::White), b.choose(&board, Color::White));
        }
    }

    #[test]
    fn test_choose_without_moves_is_none() {
        assert_eq!(RandomMover::new(Some(1)).choose(&Board::empty(), Color::Black), None);
    }
}
