//! In-process bots behind the room's [`BotCapability`] seam.

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use othello_bots::BotRoster;
use othello_engine::Position;
use othello_room::{BotCapability, BotError, BotRequest};

/// Runs [`othello_bots`] strategies on Tokio's blocking pool.
#[derive(Clone)]
pub struct LocalBots {
    roster: BotRoster,
}

impl LocalBots {
    pub fn new(roster: BotRoster) -> Self {
        Self { roster }
    }

    /// Every bot in [`BotRoster::standard`].
    pub fn standard() -> Self {
        Self::new(BotRoster::standard())
    }
}

impl Default for LocalBots {
    fn default() -> Self {
        Self::standard()
    }
}

impl BotCapability for LocalBots {
    fn bot_names(&self) -> Vec<String> {
        self.roster.names()
    }

    fn request_move(
        &self,
        request: BotRequest,
    ) -> BoxFuture<'static, Result<Option<Position>, BotError>> {
        let Some(strategy) = self.roster.get(&request.bot) else {
            return future::ready(Err(BotError::UnknownBot(request.bot))).boxed();
        };
        async move {
            let BotRequest { bot, board, color } = request;
            tokio::task::spawn_blocking(move || strategy.choose(&board, color))
                .await
                .map_err(|e| BotError::Failed(format!("{bot}: {e}")))
        }
        .boxed()
    }
}
