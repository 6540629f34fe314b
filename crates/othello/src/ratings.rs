//! Elo ratings shared by every room on the server.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use othello_engine::{Color, Score};
use othello_room::RatingService;

/// Rating given to a name the store has not seen.
pub const INITIAL_RATING: i32 = 1500;

/// Largest change one game can make.
pub const K_FACTOR: f64 = 32.0;

/// An Elo rating store, optionally backed by a JSON file of
/// `{"name": rating}`.
///
/// The file is read once on [`load`](Self::load) and rewritten after every
/// recorded game. File errors are logged and otherwise ignored so that a
/// full disk never interferes with play.
#[derive(Debug, Default)]
pub struct EloRatings {
    table: Mutex<HashMap<String, i32>>,
    path: Option<PathBuf>,
}

impl EloRatings {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the store at `path`. A missing or unreadable file starts
    /// empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let table = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(table) => table,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ratings file is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read ratings file");
                HashMap::new()
            }
        };
        tracing::info!(path = %path.display(), players = table.len(), "ratings loaded");
        Self {
            table: Mutex::new(table),
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, i32>> {
        // A panic mid-update leaves at worst one stale entry.
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, table: &HashMap<String, i32>) {
        let Some(path) = &self.path else {
            return;
        };
        let result = serde_json::to_vec_pretty(table)
            .map_err(std::io::Error::other)
            .and_then(|bytes| std::fs::write(path, bytes));
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to save ratings");
        }
    }
}

/// Points black gains (and white loses) for a game between the two
/// ratings.
fn black_delta(black: i32, white: i32, score: Score) -> i32 {
    let expected = 1.0 / (1.0 + 10f64.powf(f64::from(white - black) / 400.0));
    let actual = match score.winner() {
        Some(Color::Black) => 1.0,
        Some(Color::White) => 0.0,
        None => 0.5,
    };
    (K_FACTOR * (actual - expected)).round() as i32
}

impl RatingService for EloRatings {
    fn rating(&self, name: &str) -> i32 {
        self.lock().get(name).copied().unwrap_or(INITIAL_RATING)
    }

    fn record_game(&self, black: &str, white: &str, score: Score) {
        if black == white {
            tracing::debug!(name = black, "same name on both seats, game not rated");
            return;
        }
        let mut table = self.lock();
        let rb = table.get(black).copied().unwrap_or(INITIAL_RATING);
        let rw = table.get(white).copied().unwrap_or(INITIAL_RATING);
        let delta = black_delta(rb, rw, score);
        table.insert(black.to_string(), rb + delta);
        table.insert(white.to_string(), rw - delta);
        tracing::info!(
            black,
            white,
            black_rating = rb + delta,
            white_rating = rw - delta,
            "game rated"
        );
        self.persist(&table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(black: usize, white: usize) -> Score {
        Score { black, white }
    }

    fn scratch_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("othello-ratings-{tag}-{}.json", std::process::id()))
    }

    #[test]
    fn test_rating_unknown_name_is_initial() {
        let ratings = EloRatings::in_memory();
        assert_eq!(ratings.rating("Ann"), INITIAL_RATING);
    }

    #[test]
    fn test_record_game_equal_players_moves_half_k() {
        let ratings = EloRatings::in_memory();
        ratings.record_game("Ann", "Bo", score(40, 24));
        assert_eq!(ratings.rating("Ann"), 1516);
        assert_eq!(ratings.rating("Bo"), 1484);
    }

    #[test]
    fn test_record_game_draw_between_equals_changes_nothing() {
        let ratings = EloRatings::in_memory();
        ratings.record_game("Ann", "Bo", score(32, 32));
        assert_eq!(ratings.rating("Ann"), 1500);
        assert_eq!(ratings.rating("Bo"), 1500);
    }

    #[test]
    fn test_record_game_upset_moves_more_than_expected_win() {
        // 400 points apart: the favourite is expected to score 10/11.
        assert_eq!(black_delta(1900, 1500, score(40, 20)), 3);
        assert_eq!(black_delta(1500, 1900, score(40, 20)), 29);
        assert_eq!(black_delta(1500, 1900, score(20, 40)), -3);
    }

    #[test]
    fn test_record_game_same_name_is_ignored() {
        let ratings = EloRatings::in_memory();
        ratings.record_game("Ann", "Ann", score(40, 24));
        assert_eq!(ratings.rating("Ann"), INITIAL_RATING);
    }

    #[test]
    fn test_load_missing_file_starts_empty() {
        let path = scratch_file("missing");
        let _ = std::fs::remove_file(&path);
        let ratings = EloRatings::load(&path);
        assert_eq!(ratings.rating("Ann"), INITIAL_RATING);
        assert_eq!(ratings.path(), Some(path.as_path()));
    }

    #[test]
    fn test_record_game_persists_and_reloads() {
        let path = scratch_file("persist");
        let _ = std::fs::remove_file(&path);

        let ratings = EloRatings::load(&path);
        ratings.record_game("Ann", "David", score(10, 54));
        drop(ratings);

        let reloaded = EloRatings::load(&path);
        assert_eq!(reloaded.rating("Ann"), 1484);
        assert_eq!(reloaded.rating("David"), 1516);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_corrupt_file_starts_empty() {
        let path = scratch_file("corrupt");
        std::fs::write(&path, b"{not json").unwrap();
        let ratings = EloRatings::load(&path);
        assert_eq!(ratings.rating("Ann"), INITIAL_RATING);
        let _ = std::fs::remove_file(&path);
    }
}
