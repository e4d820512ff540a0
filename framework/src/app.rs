//! Application runner
//!
//! Parses the command line and drives the process lifecycle: configuration,
//! database context, migrations, route table and server.
//!
//! # Example
//!
//! ```rust,ignore
//! use kit::Application;
//!
//! #[tokio::main]
//! async fn main() {
//!     Application::new()
//!         .routes(routes::register)
//!         .self_test(selftest::run)
//!         .migrations::<migrations::Migrator>()
//!         .run()
//!         .await
//!         .expect("todo-app failed");
//! }
//! ```

use crate::config::{Config, DatabaseConfig, ServerConfig};
use crate::database::DbContext;
use crate::error::FrameworkError;
use crate::routing::RouteTable;
use crate::server::Server;
use clap::{Parser, Subcommand};
use sea_orm_migration::prelude::*;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tracing::info;

/// CLI structure for the service
#[derive(Parser)]
#[command(name = "todo-app")]
#[command(about = "Todo service and utilities")]
struct Cli {
    /// Directory holding the .env files
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server (default command)
    Serve {
        /// Permissive cross-origin mode for local front-end development
        #[arg(long)]
        dev: bool,
        /// Port to listen on (overrides SERVER_PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Skip running migrations on startup
        #[arg(long)]
        no_migrate: bool,
    },
    /// Run pending database migrations
    Migrate,
    /// Show migration status
    #[command(name = "migrate:status")]
    MigrateStatus,
    /// Rollback the last migration(s)
    #[command(name = "migrate:rollback")]
    MigrateRollback {
        /// Number of migrations to rollback
        #[arg(default_value = "1")]
        steps: u32,
    },
    /// Drop all tables and re-run all migrations
    #[command(name = "migrate:fresh")]
    MigrateFresh,
    /// Exercise the storage layer against a disposable database
    #[command(name = "self-test")]
    SelfTest,
}

type RoutesFn = Box<dyn FnOnce(DbContext) -> Result<RouteTable, FrameworkError> + Send>;
type SelfTestFn = Box<
    dyn FnOnce(DbContext) -> Pin<Box<dyn Future<Output = Result<(), FrameworkError>> + Send>>
        + Send,
>;

/// Placeholder type for when no migrator is configured
pub struct NoMigrator;

impl MigratorTrait for NoMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![]
    }
}

/// Application builder
pub struct Application<M = NoMigrator>
where
    M: MigratorTrait,
{
    routes_fn: Option<RoutesFn>,
    self_test_fn: Option<SelfTestFn>,
    _migrator: std::marker::PhantomData<M>,
}

impl Application<NoMigrator> {
    pub fn new() -> Self {
        Application {
            routes_fn: None,
            self_test_fn: None,
            _migrator: std::marker::PhantomData,
        }
    }
}

impl Default for Application<NoMigrator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Application<M>
where
    M: MigratorTrait,
{
    /// Register the function building the route table
    ///
    /// It runs once per `serve`, after the database context is open.
    pub fn routes<F>(mut self, f: F) -> Self
    where
        F: FnOnce(DbContext) -> Result<RouteTable, FrameworkError> + Send + 'static,
    {
        self.routes_fn = Some(Box::new(f));
        self
    }

    /// Register the routine run by the `self-test` command
    pub fn self_test<F, Fut>(mut self, f: F) -> Self
    where
        F: FnOnce(DbContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), FrameworkError>> + Send + 'static,
    {
        self.self_test_fn = Some(Box::new(move |db| Box::pin(f(db))));
        self
    }

    /// Configure the migrator type for database migrations
    pub fn migrations<NewM>(self) -> Application<NewM>
    where
        NewM: MigratorTrait,
    {
        Application {
            routes_fn: self.routes_fn,
            self_test_fn: self.self_test_fn,
            _migrator: std::marker::PhantomData,
        }
    }

    /// Parse the command line and run the selected command
    pub async fn run(self) -> Result<(), FrameworkError> {
        let cli = Cli::parse();
        let env = Config::init(&cli.root);
        info!(environment = %env, "configuration loaded");

        let command = cli.command.unwrap_or(Commands::Serve {
            dev: false,
            port: None,
            no_migrate: false,
        });

        match command {
            Commands::Serve {
                dev,
                port,
                no_migrate,
            } => self.serve(dev, port, no_migrate).await,
            Commands::Migrate => {
                with_database(&DatabaseConfig::from_env(), |db| async move {
                    M::up(db.connection().inner(), None).await?;
                    info!("migrations completed");
                    Ok(())
                })
                .await
            }
            Commands::MigrateStatus => {
                with_database(&DatabaseConfig::from_env(), |db| async move {
                    M::status(db.connection().inner()).await?;
                    Ok(())
                })
                .await
            }
            Commands::MigrateRollback { steps } => {
                with_database(&DatabaseConfig::from_env(), |db| async move {
                    M::down(db.connection().inner(), Some(steps)).await?;
                    info!(steps, "rollback completed");
                    Ok(())
                })
                .await
            }
            Commands::MigrateFresh => {
                with_database(&DatabaseConfig::from_env(), |db| async move {
                    M::fresh(db.connection().inner()).await?;
                    info!("database refreshed");
                    Ok(())
                })
                .await
            }
            Commands::SelfTest => self.self_test_run().await,
        }
    }

    async fn serve(
        self,
        dev: bool,
        port: Option<u16>,
        no_migrate: bool,
    ) -> Result<(), FrameworkError> {
        let mut config = ServerConfig::from_env();
        config.dev_mode |= dev;
        if let Some(port) = port {
            config.port = port;
        }

        let routes_fn = self
            .routes_fn
            .ok_or_else(|| FrameworkError::Config("no routes registered".into()))?;

        with_database(&DatabaseConfig::from_env(), move |db| async move {
            if !no_migrate {
                M::up(db.connection().inner(), None).await?;
            }
            let routes = routes_fn(db)?;
            Server::from_config(routes, &config).run().await
        })
        .await
    }

    async fn self_test_run(self) -> Result<(), FrameworkError> {
        let self_test = self
            .self_test_fn
            .ok_or_else(|| FrameworkError::Config("no self-test registered".into()))?;

        with_database(&DatabaseConfig::disposable(), move |db| async move {
            M::up(db.connection().inner(), None).await?;
            self_test(db).await?;
            info!("all self-tests passed");
            Ok(())
        })
        .await
    }
}

/// Open a context, run `f`, and close the context whatever `f` returned
async fn with_database<F, Fut>(config: &DatabaseConfig, f: F) -> Result<(), FrameworkError>
where
    F: FnOnce(DbContext) -> Fut,
    Fut: Future<Output = Result<(), FrameworkError>>,
{
    let db = DbContext::connect(config).await?;
    let outcome = f(db.clone()).await;
    let closed = db.close().await;
    outcome.and(closed)
}
