//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every room a registry spawns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Capacity of each room's command channel. Senders wait when full.
    pub command_buffer: usize,

    /// How many times a bot is asked again after an answer that fails
    /// validation, before it is left idle.
    pub max_bot_retries: u32,

    /// Chat lines kept for replay to late joiners.
    pub chat_log_len: usize,

    /// Display name for connections that never declared one.
    pub default_name: String,

    /// How long a seat freed by a disconnect can be taken back by a new
    /// connection declaring the same name. Zero turns this off.
    pub reclaim_window: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            command_buffer: 64,
            max_bot_retries: 3,
            chat_log_len: 50,
            default_name: "Guest".to_string(),
            reclaim_window: Duration::from_secs(60),
        }
    }
}
