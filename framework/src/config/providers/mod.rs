mod database;
mod server;

pub use database::{DatabaseConfig, DatabaseConfigBuilder};
pub use server::{ServerConfig, ServerConfigBuilder};
