//! Out-of-band bot moves.
//!
//! The room actor never waits for a bot. When a bot's turn comes up the
//! bridge asks the [`BotCapability`] for a move and hands the actor a
//! future that resolves to a [`BotAnswer`]. The actor spawns it and the
//! answer comes back later as an ordinary room command, tagged with the
//! state version it was computed for:
//!
//! ```text
//!   actor ──request(version 7)──→ capability ──(thinking)──┐
//!     ↑                                                    │
//!     └────────────── BotAnswer { version: 7 } ←───────────┘
//! ```
//!
//! An answer for an older version is dropped. A current answer is
//! submitted through the same move path as a human's, so an illegal
//! answer is rejected and the bot is asked again, up to a retry limit.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use othello_engine::{Board, Color, Position};

/// What a bot is asked to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotRequest {
    /// Bot name as listed by [`BotCapability::bot_names`]. Difficulty
    /// variants are distinct names.
    pub bot: String,
    pub board: Board,
    pub color: Color,
}

/// A bot failed to produce an answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BotError {
    #[error("unknown bot {0:?}")]
    UnknownBot(String),

    #[error("bot failed: {0}")]
    Failed(String),
}

/// The set of bots a room can invite, and a way to ask them for moves.
///
/// `request_move` must return quickly; the thinking happens when the
/// returned future is polled, which is never inside a room actor.
pub trait BotCapability: Send + Sync + 'static {
    fn bot_names(&self) -> Vec<String>;

    /// Asks `request.bot` for a move. `Ok(None)` means the bot found no
    /// legal move.
    fn request_move(
        &self,
        request: BotRequest,
    ) -> BoxFuture<'static, Result<Option<Position>, BotError>>;
}

/// A bot's reply, tagged with the request it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotAnswer {
    pub color: Color,
    pub version: u64,
    pub result: Result<Option<Position>, BotError>,
}

#[derive(Debug, Clone)]
struct Pending {
    color: Color,
    version: u64,
    bot: String,
}

/// Tracks the one outstanding bot request of a room.
pub(crate) struct BotBridge {
    capability: Arc<dyn BotCapability>,
    max_retries: u32,
    pending: Option<Pending>,
    failures: u32,
    failures_version: u64,
}

impl BotBridge {
    pub(crate) fn new(capability: Arc<dyn BotCapability>, max_retries: u32) -> Self {
        Self {
            capability,
            max_retries,
            pending: None,
            failures: 0,
            failures_version: 0,
        }
    }

    pub(crate) fn bot_names(&self) -> Vec<String> {
        self.capability.bot_names()
    }

    /// Forgets the outstanding request unless it is for `color` at
    /// `version`. Its answer will then be discarded as stale.
    pub(crate) fn retain_current(&mut self, color: Option<Color>, version: u64) {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|p| Some(p.color) == color && p.version == version);
        if !current {
            self.pending = None;
        }
    }

    /// Asks `bot` to move for `color` at `version`.
    ///
    /// Returns `None` when a request for this position is already
    /// outstanding or the bot has used up its retries on it.
    pub(crate) fn request(
        &mut self,
        bot: &str,
        color: Color,
        board: Board,
        version: u64,
    ) -> Option<BoxFuture<'static, BotAnswer>> {
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.color == color && p.version == version)
        {
            return None;
        }
        if self.failures_version != version {
            self.failures = 0;
            self.failures_version = version;
        }
        if self.failures > self.max_retries {
            return None;
        }

        self.pending = Some(Pending {
            color,
            version,
            bot: bot.to_string(),
        });
        let answer = self.capability.request_move(BotRequest {
            bot: bot.to_string(),
            board,
            color,
        });
        Some(Box::pin(async move {
            BotAnswer {
                color,
                version,
                result: answer.await,
            }
        }))
    }

    /// Matches `answer` against the outstanding request and clears it.
    /// Returns the bot's name if the answer is current.
    pub(crate) fn resolve(&mut self, answer: &BotAnswer) -> Option<String> {
        match &self.pending {
            Some(p) if p.color == answer.color && p.version == answer.version => {
                self.pending.take().map(|p| p.bot)
            }
            _ => None,
        }
    }

    /// Counts a rejected answer for the current position. Returns `true`
    /// while the bot may still be asked again.
    pub(crate) fn record_failure(&mut self) -> bool {
        self.failures += 1;
        self.failures <= self.max_retries
    }

    pub(crate) fn record_success(&mut self) {
        self.failures = 0;
    }
}
