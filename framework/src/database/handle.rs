use crate::error::FrameworkError;
use async_trait::async_trait;
use sea_orm::{DbBackend, ExecResult, QueryResult, Statement};

/// Capability to run SQL against the store
///
/// Implemented by the shared connection (`DbConnection`, `DbContext`) and
/// by an open `Transaction`, so every storage operation can run either
/// directly or inside a caller-supplied transaction.
///
/// # Example
///
/// ```rust,ignore
/// async fn count(db: &dyn DatabaseHandle) -> Result<usize, FrameworkError> {
///     let stmt = Statement::from_string(db.backend(), "select rowid from todo");
///     Ok(db.query_all(stmt).await?.len())
/// }
///
/// count(&ctx).await?;        // shared connection
/// count(&tx).await?;         // inside a transaction
/// ```
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    /// Backend used to build statements
    fn backend(&self) -> DbBackend;

    /// Execute a statement that returns no rows
    async fn execute(&self, stmt: Statement) -> Result<ExecResult, FrameworkError>;

    /// Fetch at most one row
    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, FrameworkError>;

    /// Fetch every row
    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, FrameworkError>;
}
