use kit::Application;
use todo_app::{migrations::Migrator, routes, selftest};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let result = Application::new()
        .routes(routes::register)
        .self_test(selftest::run)
        .migrations::<Migrator>()
        .run()
        .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "todo-app failed");
        std::process::exit(1);
    }
}
