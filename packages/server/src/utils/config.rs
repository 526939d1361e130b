use once_cell::sync::Lazy;

use crate::models::config::ServerConfig;

/// Process-wide settings, read from the environment on first use.
pub static CONFIG: Lazy<ServerConfig> = Lazy::new(ServerConfig::from_env);
