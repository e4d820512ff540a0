//! Deadline-bounded transactions

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, ExecResult,
    IsolationLevel, QueryResult, Statement, TransactionTrait,
};
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::warn;

use crate::database::DatabaseHandle;
use crate::error::FrameworkError;

/// An open, serializable transaction with a deadline
///
/// `commit` and `rollback` consume the transaction, so it can be finalized
/// only once. A transaction dropped without either is rolled back by the
/// driver. Statements and the commit fail with `FrameworkError::Timeout`
/// once the deadline has passed.
///
/// # Example
///
/// ```rust,ignore
/// let tx = ctx.begin().await?;
/// let outcome = Todo::create(&tx, "Buy milk", false).await;
/// let todo = tx.finish(outcome).await?;
/// ```
pub struct Transaction {
    inner: DatabaseTransaction,
    deadline: Instant,
    timeout: Duration,
}

impl Transaction {
    pub(crate) async fn begin(
        conn: &DatabaseConnection,
        timeout: Duration,
    ) -> Result<Self, FrameworkError> {
        let deadline = Instant::now() + timeout;

        // SQLite transactions are always serializable and reject the option
        let isolation = match conn.get_database_backend() {
            DbBackend::Sqlite => None,
            _ => Some(IsolationLevel::Serializable),
        };

        let inner = time::timeout_at(deadline, conn.begin_with_config(isolation, None))
            .await
            .map_err(|_| FrameworkError::Timeout(timeout))?
            .map_err(|e| FrameworkError::transaction(e.to_string()))?;

        Ok(Self {
            inner,
            deadline,
            timeout,
        })
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Commit, unless the deadline already passed
    pub async fn commit(self) -> Result<(), FrameworkError> {
        if self.is_expired() {
            let timeout = self.timeout;
            self.rollback_quietly().await;
            return Err(FrameworkError::Timeout(timeout));
        }

        let Self {
            inner,
            deadline,
            timeout,
        } = self;
        time::timeout_at(deadline, inner.commit())
            .await
            .map_err(|_| FrameworkError::Timeout(timeout))?
            .map_err(|e| FrameworkError::transaction(e.to_string()))
    }

    pub async fn rollback(self) -> Result<(), FrameworkError> {
        self.inner
            .rollback()
            .await
            .map_err(|e| FrameworkError::transaction(e.to_string()))
    }

    /// Commit on success, roll back on failure
    ///
    /// A failed commit is reported as the error. A failed rollback is only
    /// logged; the error that caused it is returned.
    pub async fn finish<T>(
        self,
        outcome: Result<T, FrameworkError>,
    ) -> Result<T, FrameworkError> {
        match outcome {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                self.rollback_quietly().await;
                Err(err)
            }
        }
    }

    async fn rollback_quietly(self) {
        if let Err(e) = self.rollback().await {
            warn!(error = %e, "rollback failed");
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, FrameworkError>
    where
        F: Future<Output = Result<T, DbErr>>,
    {
        // timeout_at polls the inner future before the timer, so check first
        if self.is_expired() {
            return Err(FrameworkError::Timeout(self.timeout));
        }
        time::timeout_at(self.deadline, fut)
            .await
            .map_err(|_| FrameworkError::Timeout(self.timeout))?
            .map_err(FrameworkError::from)
    }
}

#[async_trait]
impl DatabaseHandle for Transaction {
    fn backend(&self) -> DbBackend {
        self.inner.get_database_backend()
    }

    async fn execute(&self, stmt: Statement) -> Result<ExecResult, FrameworkError> {
        self.bounded(self.inner.execute(stmt)).await
    }

    async fn query_one(&self, stmt: Statement) -> Result<Option<QueryResult>, FrameworkError> {
        self.bounded(self.inner.query_one(stmt)).await
    }

    async fn query_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, FrameworkError> {
        self.bounded(self.inner.query_all(stmt)).await
    }
}

#[cfg(test)]
mod tests {
    use crate::database::{DatabaseHandle, DbContext};
    use crate::error::FrameworkError;
    use crate::testing::TestDatabase;
    use sea_orm::Statement;
    use std::time::Duration;

    async fn setup() -> TestDatabase {
        let db = TestDatabase::empty().await.expect("test db");
        let stmt = Statement::from_string(db.backend(), "create table note (body text not null)");
        db.execute(stmt).await.expect("create table");
        db
    }

    async fn insert(db: &dyn DatabaseHandle, body: &str) -> Result<(), FrameworkError> {
        let stmt = Statement::from_sql_and_values(
            db.backend(),
            "insert into note (body) values (?)",
            [body.into()],
        );
        db.execute(stmt).await.map(|_| ())
    }

    async fn count(db: &DbContext) -> usize {
        let stmt = Statement::from_string(db.backend(), "select body from note");
        db.query_all(stmt).await.expect("count").len()
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let db = setup().await;

        let tx = db.begin().await.unwrap();
        insert(&tx, "kept").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(count(&db).await, 1);
    }

    #[tokio::test]
    async fn rolled_back_writes_are_discarded() {
        let db = setup().await;

        let tx = db.begin().await.unwrap();
        insert(&tx, "discarded").await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(count(&db).await, 0);
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_no_rows() {
        let db = setup().await;

        {
            let tx = db.begin().await.unwrap();
            insert(&tx, "leaked").await.unwrap();
        }

        assert_eq!(count(&db).await, 0);
    }

    #[tokio::test]
    async fn finish_rolls_back_on_error() {
        let db = setup().await;

        let tx = db.begin().await.unwrap();
        let outcome = match insert(&tx, "half done").await {
            Ok(()) => Err::<(), _>(FrameworkError::Serialization("boom".into())),
            Err(e) => Err(e),
        };
        let result = tx.finish(outcome).await;

        assert!(matches!(result, Err(FrameworkError::Serialization(_))));
        assert_eq!(count(&db).await, 0);
    }

    #[tokio::test]
    async fn expired_transaction_refuses_work() {
        let db = TestDatabase::empty_with_timeout(Duration::from_millis(20))
            .await
            .expect("test db");
        let stmt = Statement::from_string(db.backend(), "create table note (body text not null)");
        db.execute(stmt).await.unwrap();

        let tx = db.begin().await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(tx.is_expired());

        let result = insert(&tx, "late").await;
        assert!(matches!(result, Err(FrameworkError::Timeout(_))));

        let result = tx.commit().await;
        assert!(matches!(result, Err(FrameworkError::Timeout(_))));
        assert_eq!(count(&db).await, 0);
    }
}
