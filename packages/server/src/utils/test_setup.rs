use dotenvy::dotenv;
use std::sync::Once;
use std::time::Duration;

use crate::models::config::ServerConfig;

static INIT: Once = Once::new();

pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
    });
}

/// Short timings so a whole game fits in a test.
pub fn test_config() -> ServerConfig {
    setup_test_env();
    ServerConfig {
        port: 0,
        log_level: "debug".to_string(),
        role_seconds: 1,
        talk_seconds: 5,
        vote_seconds: 5,
        tick_seconds: 1,
        start_delay: Duration::ZERO,
        ..ServerConfig::default()
    }
}
