//! The rating collaborator.

use othello_engine::Score;

/// External source of player ratings.
///
/// Rooms only store and relay what this returns; they never compute a
/// rating themselves. Implementations are called from inside room actors
/// and must not block for long.
pub trait RatingService: Send + Sync + 'static {
    /// Current rating of `name`, or the initial rating for a newcomer.
    fn rating(&self, name: &str) -> i32;

    /// Records a finished game between the two seat occupants.
    fn record_game(&self, black: &str, white: &str, score: Score);
}
