//! Configuration for the todo service
//!
//! - `.env` files loaded with environment-based precedence
//! - Typed configuration structs built from environment variables
//!
//! # Example
//!
//! ```rust,no_run
//! use kit::{Config, ServerConfig};
//!
//! Config::init(std::path::Path::new("."));
//! let server = ServerConfig::from_env();
//! println!("Server port: {}", server.port);
//! ```

pub mod env;
pub mod providers;

pub use env::{env, env_flag, env_optional, load_dotenv, Environment};
pub use providers::{DatabaseConfig, DatabaseConfigBuilder, ServerConfig, ServerConfigBuilder};

use std::path::Path;

/// Configuration entry point
pub struct Config;

impl Config {
    /// Load `.env` files from `project_root` and return the detected environment
    ///
    /// Call once at startup, before any `*Config::from_env()`.
    pub fn init(project_root: &Path) -> Environment {
        load_dotenv(project_root)
    }
}
