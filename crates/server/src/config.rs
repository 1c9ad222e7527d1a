//! Server configuration (bind address, cover providers).

use shelfwise_core::config::{load_config, CoverConfig};

/// Configuration for the cover server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host:port to bind (e.g. "127.0.0.1:3040" or "0.0.0.0:3040").
    pub bind: String,
    /// Provider endpoints and resolver tuning, from the shared config file.
    pub covers: CoverConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3040".to_string(),
            covers: CoverConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build config from the config file, then the environment.
    /// - `SHELFWISE_BIND`: host:port (default: 127.0.0.1:3040)
    pub fn from_env() -> Self {
        let mut c = Self {
            covers: load_config().covers,
            ..Self::default()
        };
        if let Ok(b) = std::env::var("SHELFWISE_BIND") {
            c.bind = b;
        }
        c
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind
    }
}
