use crate::config::env::{env, env_flag};
use std::path::PathBuf;
use std::time::Duration;

/// SQLite database configuration
///
/// | Variable | Default |
/// |---|---|
/// | `DB_PATH` | `data.db` |
/// | `DB_TEST_PATH` | `test.db` |
/// | `DB_MAX_CONNECTIONS` | `5` |
/// | `DB_CONNECT_TIMEOUT` | `30` (seconds) |
/// | `DB_TX_TIMEOUT_MS` | `3000` |
/// | `DB_LOGGING` | `false` |
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file
    pub path: PathBuf,
    /// Delete the file when the context is closed
    pub disposable: bool,
    pub max_connections: u32,
    /// Connect timeout in seconds
    pub connect_timeout: u64,
    /// Upper bound on the lifetime of every transaction
    pub transaction_timeout: Duration,
    /// Log every SQL statement
    pub logging: bool,
}

impl DatabaseConfig {
    /// The persistent database
    pub fn from_env() -> Self {
        Self {
            path: PathBuf::from(env("DB_PATH", "data.db".to_string())),
            disposable: false,
            max_connections: env("DB_MAX_CONNECTIONS", 5),
            connect_timeout: env("DB_CONNECT_TIMEOUT", 30),
            transaction_timeout: Duration::from_millis(env("DB_TX_TIMEOUT_MS", 3000)),
            logging: env_flag("DB_LOGGING", false),
        }
    }

    /// The disposable test database, removed again on close
    pub fn disposable() -> Self {
        Self {
            path: PathBuf::from(env("DB_TEST_PATH", "test.db".to_string())),
            disposable: true,
            ..Self::from_env()
        }
    }

    pub fn builder() -> DatabaseConfigBuilder {
        DatabaseConfigBuilder::default()
    }

    /// sqlx connection URL; `mode=rwc` creates the file when missing
    pub fn url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path.display())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Builder for DatabaseConfig
#[derive(Default)]
pub struct DatabaseConfigBuilder {
    path: Option<PathBuf>,
    max_connections: Option<u32>,
    transaction_timeout: Option<Duration>,
}

impl DatabaseConfigBuilder {
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = Some(max);
        self
    }

    pub fn transaction_timeout(mut self, timeout: Duration) -> Self {
        self.transaction_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> DatabaseConfig {
        let default = DatabaseConfig::from_env();
        DatabaseConfig {
            path: self.path.unwrap_or(default.path),
            disposable: default.disposable,
            max_connections: self.max_connections.unwrap_or(default.max_connections),
            connect_timeout: default.connect_timeout,
            transaction_timeout: self
                .transaction_timeout
                .unwrap_or(default.transaction_timeout),
            logging: default.logging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_creates_missing_file() {
        let config = DatabaseConfig::builder().path("/tmp/todo.db").build();
        assert_eq!(config.url(), "sqlite:/tmp/todo.db?mode=rwc");
    }

    #[test]
    fn builder_overrides_transaction_timeout() {
        let config = DatabaseConfig::builder()
            .transaction_timeout(Duration::from_millis(250))
            .build();
        assert_eq!(config.transaction_timeout, Duration::from_millis(250));
        assert!(!config.disposable);
    }
}
