//! Database access for the todo service
//!
//! SQLite through SeaORM's sqlx driver, exposed to the rest of the code as
//! three pieces:
//!
//! - [`DbContext`]: the single per-process handle, passed explicitly to
//!   every handler that needs the store
//! - [`Transaction`]: a serializable transaction bounded by a deadline
//! - [`DatabaseHandle`]: the capability both of them implement, so storage
//!   operations do not care which one they run on
//!
//! # Example
//!
//! ```rust,ignore
//! let ctx = DbContext::connect(&DatabaseConfig::from_env()).await?;
//!
//! let todos = Todo::all(&ctx).await?;            // shared connection
//!
//! let tx = ctx.begin().await?;                   // explicit transaction
//! let outcome = Todo::create(&tx, "Buy milk", false).await;
//! let todo = tx.finish(outcome).await?;
//!
//! ctx.close().await?;
//! ```

pub mod connection;
pub mod handle;
pub mod transaction;

pub use connection::DbConnection;
pub use handle::DatabaseHandle;
pub use transaction::Transaction;

use async_trait::async_trait;
use sea_orm::{DbBackend, ExecResult, QueryResult, Statement};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::error::FrameworkError;

/// Process-wide database context
///
/// Built once at startup and closed once at shutdown. Clones share the
/// same connection pool, so handing one to each handler is cheap.
#[derive(Clone)]
pub struct DbContext {
    connection: DbConnection,
    transaction_timeout: Duration,
    disposable: Option<PathBuf>,
}

impl DbContext {
    /// Open the database described by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, FrameworkError> {
        let connection = DbConnection::connect(config).await?;
        info!(path = %config.path.display(), disposable = config.disposable, "database opened");

        Ok(Self {
            connection,
            transaction_timeout: config.transaction_timeout,
            disposable: config.disposable.then(|| config.path.clone()),
        })
    }

    /// Begin a serializable transaction bounded by the configured timeout
    pub async fn begin(&self) -> Result<Transaction, FrameworkError> {
        Transaction::begin(self.connection.inner(), self.transaction_timeout).await
    }

    /// The shared connection
    pub fn connection(&self) -> &DbConnection {
        &self.connection
    }

    /// Close the pool; a disposable database file is deleted afterwards
    pub async fn close(self) -> Result<(), FrameworkError> {
        self.connection.close().await?;

        if let Some(path) = self.disposable {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "could not remove disposable database");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseHandle for DbContext {
    fn backend(&self) -> DbBackend {
        self.connection.backend()
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, FrameworkError> {
        self.connection.execute(stmt).await
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, FrameworkError> {
        self.connection.query_one(stmt).await
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, FrameworkError> {
        self.connection.query_all(stmt).await
    }
}
