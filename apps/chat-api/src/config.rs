use std::time::Duration;

/// Number of messages replayed to a user entering a room.
pub const DEFAULT_HISTORY_REPLAY_LIMIT: usize = 100;

/// Rooms that exist from startup, in display order.
pub const DEFAULT_ROOMS: [&str; 4] = ["general", "random", "tech", "support"];

/// Chat API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Allowed CORS origin. `None` allows any origin.
    pub cors_origin: Option<String>,
    /// Rooms created at startup. The first one is where new users land.
    pub default_rooms: Vec<String>,
    /// Most recent messages sent to a user when they enter a room.
    pub history_replay_limit: usize,
    /// How often the inactivity sweeper runs.
    pub sweep_interval: Duration,
    /// Users idle longer than this are demoted to offline by the sweeper.
    pub inactivity_threshold: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3001,
            cors_origin: None,
            default_rooms: DEFAULT_ROOMS.iter().map(|r| r.to_string()).collect(),
            history_replay_limit: DEFAULT_HISTORY_REPLAY_LIMIT,
            sweep_interval: Duration::from_secs(5 * 60),
            inactivity_threshold: Duration::from_secs(30 * 60),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; unset or unparsable values fall back to
    /// [`Config::default`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parsed_var("PORT").unwrap_or(defaults.port),
            cors_origin: std::env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty()),
            default_rooms: std::env::var("DEFAULT_ROOMS")
                .ok()
                .map(|v| parse_room_list(&v))
                .filter(|rooms| !rooms.is_empty())
                .unwrap_or(defaults.default_rooms),
            history_replay_limit: parsed_var("HISTORY_REPLAY_LIMIT")
                .unwrap_or(defaults.history_replay_limit),
            sweep_interval: parsed_var("SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            inactivity_threshold: parsed_var("INACTIVITY_THRESHOLD_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.inactivity_threshold),
        }
    }

    /// The room every newly registered user starts in.
    pub fn default_room(&self) -> &str {
        self.default_rooms
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_ROOMS[0])
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_room_list(value: &str) -> Vec<String> {
    let mut rooms: Vec<String> = Vec::new();
    for name in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !rooms.iter().any(|r| r == name) {
            rooms.push(name.to_string());
        }
    }
    rooms
}
