use campus_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    notifier::{HttpNotifier, LogNotifier, NotificationDispatcher, NotifierState},
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the database pool, the notification worker and the
/// HTTP server, in that order. Any failure before the listener is bound is fatal.
#[tokio::main]
async fn main() {
    // 1. Configuration (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "campus_portal=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!(?config, "Application starting");

    // 3. Database
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(config.db_timeout)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 4. Login notifications (background worker)
    let notifier: NotifierState = match &config.notify_url {
        Some(url) => Arc::new(
            HttpNotifier::new(url.clone(), config.notify_timeout)
                .expect("FATAL: Failed to build the notification HTTP client."),
        ),
        None => {
            tracing::warn!("NOTIFY_URL not set; login notices will only be logged");
            Arc::new(LogNotifier)
        }
    };
    let notifications = NotificationDispatcher::spawn(
        notifier,
        config.notify_timeout,
        config.notify_queue_capacity,
    );

    // 5. State, Router and Server
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(config, repo, notifications));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: cannot bind {bind_addr}: {e}"));

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://{bind_addr}/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("HTTP server terminated unexpectedly");
}
