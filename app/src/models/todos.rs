//! Todos model
//!
//! The entity and its storage operations. Every operation takes a
//! `DatabaseHandle`, so it runs on the shared connection when given the
//! `DbContext` and inside a transaction when given a `Transaction`.

use kit::{DatabaseHandle, FrameworkError};
use sea_orm::{FromQueryResult, Statement};
use serde::Serialize;

/// Rowid of a todo that is not (or no longer) backed by a row
pub const UNSAVED_ROWID: i64 = -1;

const SELECT: &str = "select task, complete, rowid from todo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct Todo {
    pub task: String,
    pub complete: bool,
    rowid: i64,
}

// ============================================================================
// READ OPERATIONS
// ============================================================================

impl Todo {
    /// Store-assigned identity, `UNSAVED_ROWID` once deleted
    pub fn rowid(&self) -> i64 {
        self.rowid
    }

    pub fn is_persisted(&self) -> bool {
        self.rowid != UNSAVED_ROWID
    }

    /// Fetch one todo; `None` when no row has this id
    pub async fn find(db: &dyn DatabaseHandle, rowid: i64) -> Result<Option<Todo>, FrameworkError> {
        let stmt = Statement::from_sql_and_values(
            db.backend(),
            format!("{} where rowid = ?", SELECT),
            [rowid.into()],
        );

        db.query_one(stmt)
            .await?
            .map(|row| Todo::from_query_result(&row, ""))
            .transpose()
            .map_err(FrameworkError::from)
    }

    /// Fetch every todo in store order
    ///
    /// There is no ORDER BY, so the order is whatever SQLite returns.
    pub async fn all(db: &dyn DatabaseHandle) -> Result<Vec<Todo>, FrameworkError> {
        let stmt = Statement::from_string(db.backend(), SELECT);

        db.query_all(stmt)
            .await?
            .iter()
            .map(|row| Todo::from_query_result(row, "").map_err(FrameworkError::from))
            .collect()
    }
}

// ============================================================================
// WRITE OPERATIONS
// ============================================================================

impl Todo {
    /// Insert a todo and return it with its new rowid
    ///
    /// If the driver reports an id that does not fit an i64, the todo is
    /// returned with `UNSAVED_ROWID` instead of failing the insert.
    pub async fn create(
        db: &dyn DatabaseHandle,
        task: &str,
        complete: bool,
    ) -> Result<Todo, FrameworkError> {
        let stmt = Statement::from_sql_and_values(
            db.backend(),
            "insert into todo (task, complete) values (?, ?)",
            [task.into(), complete.into()],
        );
        let result = db.execute(stmt).await?;

        Ok(Todo {
            task: task.to_string(),
            complete,
            rowid: i64::try_from(result.last_insert_id()).unwrap_or(UNSAVED_ROWID),
        })
    }

    /// Persist `task` and `complete` to the row this todo came from
    pub async fn update(&self, db: &dyn DatabaseHandle) -> Result<(), FrameworkError> {
        self.ensure_persisted()?;

        let stmt = Statement::from_sql_and_values(
            db.backend(),
            "update todo set task = ?, complete = ? where rowid = ?",
            [self.task.clone().into(), self.complete.into(), self.rowid.into()],
        );
        let result = db.execute(stmt).await?;

        match result.rows_affected() {
            0 => Err(FrameworkError::NoMatchingRow { rowid: self.rowid }),
            _ => Ok(()),
        }
    }

    /// Delete the row; on success this todo's rowid becomes `UNSAVED_ROWID`
    pub async fn delete(&mut self, db: &dyn DatabaseHandle) -> Result<(), FrameworkError> {
        self.ensure_persisted()?;

        let stmt = Statement::from_sql_and_values(
            db.backend(),
            "delete from todo where rowid = ?",
            [self.rowid.into()],
        );
        let result = db.execute(stmt).await?;

        match result.rows_affected() {
            0 => Err(FrameworkError::NoMatchingRow { rowid: self.rowid }),
            _ => {
                self.rowid = UNSAVED_ROWID;
                Ok(())
            }
        }
    }

    fn ensure_persisted(&self) -> Result<(), FrameworkError> {
        if self.is_persisted() {
            Ok(())
        } else {
            Err(FrameworkError::NoMatchingRow { rowid: self.rowid })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::Migrator;
    use kit::testing::TestDatabase;
    use pretty_assertions::assert_eq;

    async fn setup() -> TestDatabase {
        TestDatabase::fresh::<Migrator>().await.expect("test db")
    }

    #[tokio::test]
    async fn create_then_read_round_trips() {
        let db = setup().await;

        let created = Todo::create(&*db, "X", false).await.unwrap();
        assert!(created.is_persisted());

        let read = Todo::find(&*db, created.rowid()).await.unwrap().unwrap();
        assert_eq!(read, created);
    }

    #[tokio::test]
    async fn missing_row_reads_as_none_every_time() {
        let db = setup().await;

        assert_eq!(Todo::find(&*db, 404).await.unwrap(), None);
        assert_eq!(Todo::find(&*db, 404).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_is_empty_without_rows() {
        let db = setup().await;

        assert_eq!(Todo::all(&*db).await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn list_returns_every_row() {
        let db = setup().await;
        Todo::create(&*db, "first", false).await.unwrap();
        Todo::create(&*db, "second", true).await.unwrap();

        let mut tasks: Vec<_> = Todo::all(&*db)
            .await
            .unwrap()
            .into_iter()
            .map(|todo| (todo.task, todo.complete))
            .collect();
        tasks.sort();

        assert_eq!(
            tasks,
            vec![("first".to_string(), false), ("second".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn update_is_visible_to_later_reads() {
        let db = setup().await;
        let mut todo = Todo::create(&*db, "Test Item", false).await.unwrap();

        todo.complete = true;
        todo.task = "Test Item (done)".into();
        todo.update(&*db).await.unwrap();

        let read = Todo::find(&*db, todo.rowid()).await.unwrap().unwrap();
        assert!(read.complete);
        assert_eq!(read.task, "Test Item (done)");
    }

    #[tokio::test]
    async fn delete_invalidates_row_and_handle() {
        let db = setup().await;
        let mut todo = Todo::create(&*db, "Test Item 2", true).await.unwrap();
        let rowid = todo.rowid();

        todo.delete(&*db).await.unwrap();

        assert_eq!(todo.rowid(), UNSAVED_ROWID);
        assert_eq!(Todo::find(&*db, rowid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleted_handle_cannot_be_mutated_again() {
        let db = setup().await;
        let mut todo = Todo::create(&*db, "once", false).await.unwrap();
        todo.delete(&*db).await.unwrap();

        let err = todo.update(&*db).await.unwrap_err();
        assert!(matches!(err, FrameworkError::NoMatchingRow { rowid: UNSAVED_ROWID }));
        let err = todo.delete(&*db).await.unwrap_err();
        assert!(matches!(err, FrameworkError::NoMatchingRow { rowid: UNSAVED_ROWID }));
    }

    #[tokio::test]
    async fn vanished_row_is_no_matching_row() {
        let db = setup().await;
        let mut first = Todo::create(&*db, "raced", false).await.unwrap();
        let mut second = first.clone();
        let rowid = first.rowid();

        first.delete(&*db).await.unwrap();

        let err = second.update(&*db).await.unwrap_err();
        assert!(matches!(err, FrameworkError::NoMatchingRow { rowid: r } if r == rowid));
        let err = second.delete(&*db).await.unwrap_err();
        assert!(matches!(err, FrameworkError::NoMatchingRow { rowid: r } if r == rowid));
        assert_eq!(second.rowid(), rowid);
    }

    #[tokio::test]
    async fn writes_inside_transaction_commit_together() {
        let db = setup().await;

        let tx = db.begin().await.unwrap();
        let outcome = async {
            let a = Todo::create(&tx, "a", false).await?;
            let b = Todo::create(&tx, "b", false).await?;
            Ok::<_, FrameworkError>((a, b))
        }
        .await;
        let (a, b) = tx.finish(outcome).await.unwrap();

        assert!(Todo::find(&*db, a.rowid()).await.unwrap().is_some());
        assert!(Todo::find(&*db, b.rowid()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn rolled_back_create_leaves_no_row() {
        let db = setup().await;

        let tx = db.begin().await.unwrap();
        let todo = Todo::create(&tx, "never", false).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(Todo::find(&*db, todo.rowid()).await.unwrap(), None);
        assert!(Todo::all(&*db).await.unwrap().is_empty());
    }

    #[test]
    fn serializes_with_rowid() {
        let todo = Todo {
            task: "Buy milk".into(),
            complete: false,
            rowid: 3,
        };
        assert_eq!(
            kit::serde_json::to_string(&todo).unwrap(),
            r#"{"task":"Buy milk","complete":false,"rowid":3}"#
        );
    }
}
