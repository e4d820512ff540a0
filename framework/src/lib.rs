//! Framework half of the todo service
//!
//! HTTP request/response types, the ordered route table and dispatcher,
//! the hyper server, configuration, the SQLite database context with
//! deadline-bounded transactions, the CLI runner and test helpers.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod http;
pub mod routing;
pub mod server;
pub mod testing;

pub use app::Application;
pub use config::{Config, DatabaseConfig, Environment, ServerConfig};
pub use database::{DatabaseHandle, DbConnection, DbContext, Transaction};
pub use error::FrameworkError;
pub use crate::http::{HttpResponse, Method, Request, Response, JSON_CONTENT_TYPE};
pub use routing::{Handler, Route, RouteTable};
pub use server::{Dispatcher, Server};

// Re-exported so handlers can implement `Handler` without a direct dependency
pub use async_trait::async_trait;
pub use sea_orm;
pub use serde_json;
