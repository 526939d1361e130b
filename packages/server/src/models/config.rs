use onuw_engine::GameConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Default seconds per night role. Rooms may override it during setup.
    pub role_seconds: u64,
    /// Default discussion seconds. Rooms may override it during setup.
    pub talk_seconds: u64,
    /// Seconds before missing votes count as abstentions. 0 waits forever.
    pub vote_seconds: u64,
    pub tick_seconds: u64,
    /// Pause between the final setup message and the first night turn.
    pub start_delay: Duration,
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            role_seconds: 15,
            talk_seconds: 5 * 60,
            vote_seconds: 60,
            tick_seconds: 15,
            start_delay: Duration::from_millis(1000),
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

fn parsed<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl ServerConfig {
    /// Read `ONUW_*` variables, keeping the default for anything missing or
    /// unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("ONUW_HOST").unwrap_or(defaults.host),
            port: parsed("ONUW_PORT").unwrap_or(defaults.port),
            log_level: env::var("ONUW_LOG_LEVEL").unwrap_or(defaults.log_level),
            role_seconds: parsed("ONUW_ROLE_SECONDS").unwrap_or(defaults.role_seconds),
            talk_seconds: parsed("ONUW_TALK_SECONDS").unwrap_or(defaults.talk_seconds),
            vote_seconds: parsed("ONUW_VOTE_SECONDS").unwrap_or(defaults.vote_seconds),
            tick_seconds: parsed("ONUW_TICK_SECONDS").unwrap_or(defaults.tick_seconds),
            start_delay: parsed("ONUW_START_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.start_delay),
            cors_origin: env::var("ONUW_CORS_ORIGIN").unwrap_or(defaults.cors_origin),
        }
    }

    /// Timings for one game, given the room's chosen role and talk time.
    pub fn game_config(&self, role_seconds: u64, talk_seconds: u64) -> GameConfig {
        GameConfig {
            tick_interval: Duration::from_secs(self.tick_seconds),
            vote_timeout: (self.vote_seconds > 0).then(|| Duration::from_secs(self.vote_seconds)),
            ..GameConfig::from_seconds(role_seconds, talk_seconds)
        }
    }
}
