//! Common test utilities for Storefront integration tests
//!
//! This file contains shared functions for all integration tests: test
//! application setup, request helpers, and helpers for creating users and
//! products through the public API.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    Extension,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use storefront::{
    config::{base_config, ConfigUpdate},
    create_app,
    db::init_pool,
    models::{NewProduct, Role},
    repo,
    run_migrations,
    state::AppState,
};
use tower::ServiceExt;

/// Creates test state over a fresh in-memory SQLite database
///
/// Every call gets its own database, so tests stay isolated and need no
/// cleanup.
pub fn create_test_state() -> Arc<AppState> {
    let database_url = format!("file:it_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = init_pool(&database_url).unwrap();
    run_migrations(&mut pool.get().unwrap()).unwrap();

    let config = base_config(None).apply_update(ConfigUpdate {
        jwt_secret: Some("integration-secret".to_string()),
        ..ConfigUpdate::default()
    });
    Arc::new(AppState::new(pool, config))
}

/// The application as seen from one client address
pub fn app_for_client(state: &Arc<AppState>, ip: [u8; 4]) -> Router {
    create_app(state.clone()).layer(Extension(ConnectInfo(SocketAddr::from((ip, 40000)))))
}

/// Sends a JSON request and returns the status and parsed body
///
/// ### Arguments
///
/// * `app` - The test application
/// * `method` - HTTP method
/// * `uri` - Request path
/// * `token` - Bearer token, if the request is authenticated
/// * `body` - JSON body, if any
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let body = body.map_or_else(Body::empty, |json| Body::from(json.to_string()));

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (parts.status, json)
}

/// Creates an account directly in the database
pub fn create_user(state: &AppState, email: &str, password: &str, role: Role) {
    repo::create_user(&state.pool, email, password, role, None).unwrap();
}

/// Creates a product with stock and returns its id
pub fn create_product(state: &AppState, name: &str, stock: i32, limit_per_user: Option<i32>) -> i32 {
    let (product, _) = repo::create_product(
        &state.pool,
        NewProduct::new(name.to_string(), String::new(), 1.0),
        stock,
        limit_per_user,
    ).unwrap();
    product.get_id()
}

/// Logs in through the API
///
/// ### Returns
///
/// The session token and basket id
pub async fn login(app: &Router, email: &str, password: &str) -> (String, i64) {
    let (status, body) = request(
        app,
        "POST",
        "/rest/user/login",
        None,
        Some(json!({ "email": email, "password": password })),
    ).await;
    assert_eq!(status, StatusCode::OK, "Login failed: {}", body);

    let token = body["authentication"]["token"].as_str().unwrap().to_string();
    let bid = body["authentication"]["bid"].as_i64().unwrap();
    (token, bid)
}
