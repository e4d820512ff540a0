//! Testing utilities
//!
//! - [`TestDatabase`]: a migrated SQLite file in a temporary directory
//! - [`request`] / [`form_request`]: build requests without a socket
//!
//! # Example
//!
//! ```rust,ignore
//! use kit::testing::{form_request, TestDatabase};
//!
//! #[tokio::test]
//! async fn creates_a_todo() {
//!     let db = TestDatabase::fresh::<Migrator>().await.unwrap();
//!     let dispatcher = Dispatcher::new(routes::register(db.context()).unwrap());
//!
//!     let response = dispatcher
//!         .dispatch(form_request("POST", "/todo", "task=Buy+milk&complete=false"))
//!         .await;
//!     assert_eq!(response.status_code(), 201);
//! }
//! ```

use bytes::Bytes;
use sea_orm_migration::MigratorTrait;
use std::ops::Deref;
use std::time::Duration;
use tempfile::TempDir;

use crate::config::DatabaseConfig;
use crate::database::DbContext;
use crate::error::FrameworkError;
use crate::http::Request;

/// Isolated database for a single test
///
/// The file lives in its own temporary directory, which is removed when
/// the value is dropped.
pub struct TestDatabase {
    ctx: DbContext,
    _dir: TempDir,
}

impl TestDatabase {
    /// Create a database and apply every migration of `M`
    pub async fn fresh<M: MigratorTrait>() -> Result<Self, FrameworkError> {
        let db = Self::empty().await?;
        M::up(db.ctx.connection().inner(), None).await?;
        Ok(db)
    }

    /// Create a database without any schema
    pub async fn empty() -> Result<Self, FrameworkError> {
        Self::open(DatabaseConfig::builder()).await
    }

    /// Create a database without any schema and a custom transaction timeout
    pub async fn empty_with_timeout(timeout: Duration) -> Result<Self, FrameworkError> {
        Self::open(DatabaseConfig::builder().transaction_timeout(timeout)).await
    }

    async fn open(
        builder: crate::config::DatabaseConfigBuilder,
    ) -> Result<Self, FrameworkError> {
        let dir = tempfile::tempdir()
            .map_err(|e| FrameworkError::internal(format!("cannot create temp dir: {}", e)))?;
        let config = builder.path(dir.path().join("test.db")).build();
        let ctx = DbContext::connect(&config).await?;
        Ok(Self { ctx, _dir: dir })
    }

    /// A context sharing this database's pool
    pub fn context(&self) -> DbContext {
        self.ctx.clone()
    }
}

impl Deref for TestDatabase {
    type Target = DbContext;

    fn deref(&self) -> &Self::Target {
        &self.ctx
    }
}

/// Build a bodiless request
pub fn request(method: &str, path: &str) -> Request {
    build(method, path, None, Bytes::new())
}

/// Build a request with a form-urlencoded body
pub fn form_request(method: &str, path: &str, body: &str) -> Request {
    build(
        method,
        path,
        Some("application/x-www-form-urlencoded"),
        Bytes::copy_from_slice(body.as_bytes()),
    )
}

fn build(method: &str, path: &str, content_type: Option<&str>, body: Bytes) -> Request {
    let mut builder = http::Request::builder().method(method).uri(path);
    if let Some(content_type) = content_type {
        builder = builder.header("Content-Type", content_type);
    }
    match builder.body(body) {
        Ok(inner) => Request::new(inner),
        Err(e) => panic!("invalid test request {} {}: {}", method, path, e),
    }
}
