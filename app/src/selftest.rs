//! Storage smoke test run by `todo-app self-test`
//!
//! Exercises create, read, update and delete against whatever database the
//! context points at. The runner hands it a disposable file.

use kit::{DbContext, FrameworkError};
use tracing::info;

use crate::models::Todo;

fn check(condition: bool, message: &str) -> Result<(), FrameworkError> {
    if condition {
        Ok(())
    } else {
        Err(FrameworkError::internal(message))
    }
}

async fn read(db: &DbContext, rowid: i64, label: &str) -> Result<Todo, FrameworkError> {
    let todo = Todo::find(db, rowid)
        .await?
        .ok_or_else(|| FrameworkError::internal(format!("{label} | todo {rowid} was not stored")))?;
    info!(model = label, task = %todo.task, complete = todo.complete, rowid, "read back");
    Ok(todo)
}

pub async fn run(db: DbContext) -> Result<(), FrameworkError> {
    let incomplete = Todo::create(&db, "Test Item", false).await?;
    let complete = Todo::create(&db, "Test Item 2", true).await?;

    let mut a = read(&db, incomplete.rowid(), "Model A").await?;
    check(!a.complete, "Model A | expected incomplete todo, found complete todo")?;

    let mut b = read(&db, complete.rowid(), "Model B").await?;
    check(b.complete, "Model B | expected complete todo, found incomplete todo")?;

    a.complete = true;
    a.update(&db).await?;
    let a = read(&db, a.rowid(), "Model A").await?;
    check(a.complete, "Model A | expected complete todo after update")?;

    let b_id = b.rowid();
    b.delete(&db).await?;
    check(
        Todo::find(&db, b_id).await?.is_none(),
        "Model B | should be deleted, but a todo was returned",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::Migrator;
    use kit::testing::TestDatabase;

    #[tokio::test]
    async fn passes_on_a_fresh_database() {
        let db = TestDatabase::fresh::<Migrator>().await.unwrap();

        run(db.context()).await.unwrap();

        let remaining = Todo::all(&*db).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].task, "Test Item");
        assert!(remaining[0].complete);
    }

    #[tokio::test]
    async fn fails_without_schema() {
        let db = TestDatabase::empty().await.unwrap();

        assert!(run(db.context()).await.is_err());
    }
}
