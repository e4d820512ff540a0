//! Database connection management

use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, ExecResult,
    QueryResult, Statement,
};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::database::DatabaseHandle;
use crate::error::FrameworkError;

/// Wrapper around SeaORM's pooled DatabaseConnection
///
/// Cloning is cheap: every clone shares the same pool.
#[derive(Clone)]
pub struct DbConnection {
    inner: DatabaseConnection,
}

impl DbConnection {
    /// Open the connection pool described by `config`
    ///
    /// Parent directories of the database file are created when missing;
    /// the file itself is created by SQLite (`mode=rwc`).
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, FrameworkError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    FrameworkError::Config(format!(
                        "cannot create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let mut opt = ConnectOptions::new(config.url());
        opt.max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .sqlx_logging(config.logging);

        let conn = Database::connect(opt)
            .await
            .map_err(|e| FrameworkError::database(e.to_string()))?;

        Ok(Self { inner: conn })
    }

    /// Get a reference to the underlying SeaORM connection
    ///
    /// Needed for migrations and for anything SeaORM-specific.
    pub fn inner(&self) -> &DatabaseConnection {
        &self.inner
    }

    /// Close the pool
    pub async fn close(self) -> Result<(), FrameworkError> {
        self.inner.close().await.map_err(FrameworkError::from)
    }
}

#[async_trait]
impl DatabaseHandle for DbConnection {
    fn backend(&self) -> DbBackend {
        self.inner.get_database_backend()
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, FrameworkError> {
        Ok(self.inner.execute(stmt).await?)
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, FrameworkError> {
        Ok(self.inner.query_one(stmt).await?)
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, FrameworkError> {
        Ok(self.inner.query_all(stmt).await?)
    }
}
