//! Ledger service - main application entry point.
//!
//! Hosts the cashback/referral ledger behind a REST API for the platform's
//! collaborator services (cashback tracker, referral engine, storefront,
//! payout processor).
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: API key with SHA-256 hashing
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

use cashback_ledger::{config, db, handlers, middleware};

use tracing_subscriber::EnvFilter;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // Ledger API, reachable only with a valid service API key
    let authenticated_routes = Router::new()
        // Account provisioning and reads
        .route("/api/v1/accounts", post(handlers::accounts::ensure_account))
        .route(
            "/api/v1/accounts/{user_id}",
            get(handlers::accounts::get_account),
        )
        .route(
            "/api/v1/accounts/{user_id}/balance",
            get(handlers::accounts::get_balance),
        )
        .route(
            "/api/v1/accounts/{user_id}/transactions",
            get(handlers::accounts::list_transactions),
        )
        // Earning credits
        .route("/api/v1/cashback", post(handlers::cashback::add_cashback))
        .route(
            "/api/v1/referrals",
            post(handlers::referrals::add_commission),
        )
        .route(
            "/api/v1/referrals/reverse",
            post(handlers::referrals::reverse_commission),
        )
        // Withdrawal state machine
        .route(
            "/api/v1/withdrawals",
            post(handlers::withdrawals::create_withdrawal),
        )
        .route(
            "/api/v1/withdrawals/status",
            post(handlers::withdrawals::change_withdrawal_status),
        )
        // Order reservation state machine
        .route("/api/v1/orders", post(handlers::orders::create_order))
        .route(
            "/api/v1/orders/status",
            post(handlers::orders::change_order_status),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            pool.clone(),
            middleware::auth::auth_middleware,
        ));

    let app = Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .merge(authenticated_routes)
        .layer(TraceLayer::new_for_http())
        // Share database pool with all handlers via State extraction
        .with_state(pool);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
