//! Jubilee Server - Internal Library Lending System
//!
//! REST API server for the borrow-request lifecycle of the Jubilee
//! knowledge library.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jubilee_server::{
    api,
    config::AppConfig,
    db,
    repository::Repository,
    services::{sweeper::spawn_overdue_sweeper, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("jubilee_server={},tower_http=debug", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Jubilee Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool, retrying until the deadline
    let pool = db::connect_with_deadline(&config.database)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;
    let sweeper_config = config.sweeper.clone();

    // Create repository and services
    let repository = Repository::new(pool.clone());
    let services = Services::new(repository, &config);

    // Make sure the bootstrap admin account exists
    services
        .auth
        .ensure_admin_account()
        .await
        .expect("Failed to ensure bootstrap admin account");

    // Repair availability counters left behind by a crash mid-operation
    match services.catalog.reconcile_availability().await {
        Ok(0) => {}
        Ok(corrected) => tracing::warn!(corrected, "Availability counters corrected at startup"),
        Err(err) => tracing::error!(error = %err, "Startup availability reconciliation failed"),
    }

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        pool,
    };

    // Start the in-process overdue sweeper
    spawn_overdue_sweeper(state.services.sweeper.clone(), sweeper_config);

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        .route("/auth/profile", put(api::auth::update_my_profile))
        // Books (catalog)
        .route("/books", get(api::books::list_books))
        .route("/books", post(api::books::create_book))
        .route("/books/reconcile", post(api::books::reconcile_books))
        .route("/books/:id", get(api::books::get_book))
        .route("/books/:id", put(api::books::update_book))
        .route("/books/:id", delete(api::books::delete_book))
        // Borrow requests
        .route("/requests", post(api::requests::create_request))
        .route("/requests", get(api::requests::list_my_requests))
        .route("/requests/all", get(api::requests::list_all_requests))
        .route("/requests/:id/cancel", post(api::requests::cancel_request))
        .route("/requests/:id/approve", post(api::requests::approve_request))
        .route("/requests/:id/reject", post(api::requests::reject_request))
        // Borrow ledger
        .route("/borrows", get(api::borrows::list_my_borrows))
        .route("/borrows/all", get(api::borrows::list_all_borrows))
        .route("/borrows/sweep", post(api::borrows::sweep_overdue))
        .route("/borrows/:id/return", post(api::borrows::return_borrow))
        // Admin role requests
        .route("/admin-requests", post(api::admin_requests::request_admin_access))
        .route("/admin-requests/me", get(api::admin_requests::my_admin_request))
        .route("/admin-requests/pending", get(api::admin_requests::list_pending_admin_requests))
        .route("/admin-requests/:id/approve", post(api::admin_requests::approve_admin_request))
        .route("/admin-requests/:id/reject", post(api::admin_requests::reject_admin_request))
        // Notifications
        .route("/notifications", get(api::notifications::list_my_notifications))
        .route("/notifications/:id/read", post(api::notifications::mark_notification_read))
        // Statistics
        .route("/stats", get(api::stats::get_stats))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
