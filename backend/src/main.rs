//! Packing Plant Stock Ledger - Backend Server
//!
//! Daily stock bookkeeping for packing plant storage areas: reconciled
//! receipts, depletion forecasting, debounced persistence, and workbook
//! import/export.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod routes;
mod services;

pub use config::Config;

use services::{
    AreaService, ImportExportService, LedgerService, NotificationService, SaveScheduler,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub areas: AreaService,
    pub ledger: LedgerService,
    pub scheduler: SaveScheduler,
    pub notifications: NotificationService,
    pub import_export: ImportExportService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "psl_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Packing Plant Stock Ledger Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    // Create application state
    let state = build_state(db_pool, config);

    // Build application
    let app = create_app(state.clone());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wire the long-lived services; the ledger store and the debounce
/// timers must be shared across all requests.
fn build_state(db: sqlx::PgPool, config: Config) -> AppState {
    let areas = AreaService::new(db.clone());
    let ledger = LedgerService::new(db.clone());
    let notifications = NotificationService::new(db.clone());
    let scheduler = SaveScheduler::new(
        ledger.clone(),
        notifications.clone(),
        Duration::from_millis(config.ledger.debounce_ms),
    );
    let import_export = ImportExportService::new(
        areas.clone(),
        ledger.clone(),
        scheduler.clone(),
        notifications.clone(),
        config.import.auto_save,
    );

    AppState {
        db,
        config: Arc::new(config),
        areas,
        ledger,
        scheduler,
        notifications,
        import_export,
    }
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Packing Plant Stock Ledger API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
