use std::time::Duration;

/// Timing knobs for a single game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Budget each waking player gets for their night action. Every wake
    /// slot lasts exactly this long.
    pub role_time: Duration,
    /// Total discussion budget for the day.
    pub talk_time: Duration,
    /// How often the remaining discussion time is broadcast.
    pub tick_interval: Duration,
    /// Non-voters abstain once this elapses. `None` waits forever.
    pub vote_timeout: Option<Duration>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            role_time: Duration::from_secs(15),
            talk_time: Duration::from_secs(5 * 60),
            tick_interval: Duration::from_secs(15),
            vote_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl GameConfig {
    pub fn from_seconds(role_seconds: u64, talk_seconds: u64) -> Self {
        Self {
            role_time: Duration::from_secs(role_seconds),
            talk_time: Duration::from_secs(talk_seconds),
            ..Self::default()
        }
    }
}
