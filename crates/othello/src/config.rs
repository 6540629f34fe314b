//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use othello_room::RoomConfig;

/// Settings for one server process.
///
/// `Default` gives a local development setup; [`from_env`](Self::from_env)
/// applies `OTHELLO_*` overrides on top of it.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// A connection that shows no sign of life for this long is closed.
    /// Pong replies to the server's pings count, so a quiet but connected
    /// client stays.
    pub idle_timeout: Duration,

    /// How often the server pings each connection.
    pub ping_interval: Duration,

    /// A room with no connections for this long is destroyed.
    pub room_idle_ttl: Duration,

    /// How often idle rooms are looked for.
    pub sweep_interval: Duration,

    /// Where ratings persist. `None` keeps them in memory only.
    pub ratings_path: Option<PathBuf>,

    /// Settings handed to every room.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            idle_timeout: Duration::from_secs(90),
            ping_interval: Duration::from_secs(30),
            room_idle_ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(30),
            ratings_path: None,
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults with overrides from the process environment:
    ///
    /// | variable                    | field           |
    /// |-----------------------------|-----------------|
    /// | `OTHELLO_BIND`              | `bind_addr`     |
    /// | `OTHELLO_IDLE_TIMEOUT_SECS` | `idle_timeout`  |
    /// | `OTHELLO_PING_SECS`         | `ping_interval` |
    /// | `OTHELLO_ROOM_TTL_SECS`     | `room_idle_ttl` |
    /// | `OTHELLO_RATINGS_PATH`      | `ratings_path`  |
    ///
    /// Empty or unparsable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(addr) = get("OTHELLO_BIND") {
            config.bind_addr = addr;
        }
        if let Some(secs) = get("OTHELLO_IDLE_TIMEOUT_SECS").and_then(|v| seconds("OTHELLO_IDLE_TIMEOUT_SECS", &v)) {
            config.idle_timeout = secs;
        }
        if let Some(secs) = get("OTHELLO_PING_SECS").and_then(|v| seconds("OTHELLO_PING_SECS", &v)) {
            config.ping_interval = secs;
        }
        if let Some(secs) = get("OTHELLO_ROOM_TTL_SECS").and_then(|v| seconds("OTHELLO_ROOM_TTL_SECS", &v)) {
            config.room_idle_ttl = secs;
        }
        if let Some(path) = get("OTHELLO_RATINGS_PATH") {
            config.ratings_path = Some(PathBuf::from(path));
        }
        config
    }
}

fn seconds(key: &str, value: &str) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            tracing::warn!(key, value, "ignoring invalid duration");
            None
        }
    }
}
