/// Storefront: the shop's basket, review and login API
///
/// This library provides the data models, database access, authentication
/// and HTTP handlers of the shop backend. The `storefront` binary wires them
/// into a server.
///
/// ### Modules
///
/// - `auth`: Password hashing, tokens, the session store and extractor
/// - `db`: Database connection management
/// - `models`: Data structures for users, products, baskets and reviews
/// - `rate_limit`: Per-email and per-address login throttling
/// - `repo`: Repository layer for database operations
/// - `schema`: Database schema definitions
///
/// ### Web API
///
/// - `POST /rest/user/login`: Log in, returning a token and basket id
/// - `GET /rest/user/whoami`: Describe the caller
/// - `POST /rest/user/logout`: End the caller's session
/// - `POST /api/BasketItems`: Add a product to the caller's basket
/// - `GET|PUT|DELETE /api/BasketItems/{id}`: Read, change or remove a basket item
/// - `GET /rest/basket/{id}`: The caller's basket with its items
/// - `GET|PUT /rest/products/{id}/reviews`: List or write product reviews

/// Authentication module
pub mod auth;

/// Configuration module
pub mod config;

/// Database connection module
pub mod db;

/// Data transfer objects module
pub mod dto;

/// Error handling module
pub mod errors;

/// Web API handlers module
pub mod handlers;

/// Logging setup module
pub mod logging;

/// Data models module
pub mod models;

/// Login throttling module
pub mod rate_limit;

/// Repository module for database operations
pub mod repo;

/// Database schema module
pub mod schema;

/// Startup fixtures module
pub mod seed;

/// Shared application state module
pub mod state;

#[cfg(test)]
pub mod test_utils;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use handlers::*;
use state::AppState;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates the application router with all routes
///
/// ### Arguments
///
/// * `state` - The shared application state
///
/// ### Returns
///
/// An Axum Router configured with all routes, the login rate limiter,
/// CORS and request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        // Login, limited per client address
        .route(
            "/rest/user/login",
            post(login_handler).route_layer(middleware::from_fn_with_state(state.clone(), login_rate_limit)),
        )
        .route("/rest/user/whoami", get(whoami_handler))
        .route("/rest/user/logout", post(logout_handler))
        // Basket items
        .route("/api/BasketItems", post(add_basket_item_handler))
        .route(
            "/api/BasketItems/{id}",
            get(get_basket_item_handler)
                .put(update_basket_item_handler)
                .delete(delete_basket_item_handler),
        )
        .route("/rest/basket/{id}", get(get_basket_handler))
        // Product reviews
        .route("/rest/products/{id}/reviews", put(create_review_handler).get(list_reviews_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs all pending database migrations
///
/// ### Errors
///
/// Returns an error if a migration fails to apply
pub fn run_migrations(conn: &mut diesel::SqliteConnection) -> anyhow::Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    if !applied.is_empty() {
        tracing::info!("Applied {} migrations", applied.len());
    }
    Ok(())
}
