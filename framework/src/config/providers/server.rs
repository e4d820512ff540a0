use crate::config::env::{env, env_flag};
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Maximum request body size in bytes (default: 1MB)
    pub max_body_size: usize,
    /// Permissive cross-origin mode for local front-end development
    pub dev_mode: bool,
    /// Time allowed for a client to send the request head
    pub read_timeout: Duration,
}

impl ServerConfig {
    /// Build config from environment variables
    pub fn from_env() -> Self {
        Self {
            host: env("SERVER_HOST", "0.0.0.0".to_string()),
            port: env("SERVER_PORT", 8080),
            max_body_size: env("SERVER_MAX_BODY_SIZE", 1024 * 1024),
            dev_mode: env_flag("SERVER_DEV_MODE", false),
            read_timeout: Duration::from_secs(env("SERVER_READ_TIMEOUT_SECS", 10)),
        }
    }

    /// Create a builder for customizing config
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    max_body_size: Option<usize>,
    dev_mode: Option<bool>,
    read_timeout: Option<Duration>,
}

impl ServerConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = Some(size);
        self
    }

    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = Some(enabled);
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Build the ServerConfig, filling unset fields from the environment
    pub fn build(self) -> ServerConfig {
        let default = ServerConfig::from_env();
        ServerConfig {
            host: self.host.unwrap_or(default.host),
            port: self.port.unwrap_or(default.port),
            max_body_size: self.max_body_size.unwrap_or(default.max_body_size),
            dev_mode: self.dev_mode.unwrap_or(default.dev_mode),
            read_timeout: self.read_timeout.unwrap_or(default.read_timeout),
        }
    }
}
