use crate::*;
use crate::auth::AuthenticatedUser;
use crate::config::{base_config, ConfigUpdate};
use crate::models::{NewProduct, Role};
use crate::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use diesel::RunQueryDsl;
use proptest::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Sets up a test database with migrations applied
///
/// This function:
/// 1. Creates an in-memory SQLite database
/// 2. Enables foreign key constraints (done by the pool for every connection)
/// 3. Runs all migrations to set up the schema
///
/// ### Returns
///
/// A database connection pool connected to the in-memory database
pub fn setup_test_db() -> db::DbPool {
    // Plain ":memory:" gives each connection its own database, so migrations
    // run on one connection would be invisible to the others. A unique name
    // with cache=shared keeps the pool on one database per test.
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
    let pool = db::init_pool(&database_url).unwrap();

    let mut conn = pool.get().expect("Failed to get connection");
    run_migrations(&mut conn).unwrap();

    pool
}

/// Shared state over a fresh database with a fixed signing secret
pub fn setup_test_state() -> Arc<AppState> {
    let config = base_config(None).apply_update(ConfigUpdate {
        jwt_secret: Some("test-secret".to_string()),
        ..ConfigUpdate::default()
    });
    Arc::new(AppState::new(setup_test_db(), config))
}

/// Creates a user with a basket and opens a session for them
///
/// ### Returns
///
/// The session token and the basket id
pub fn login_as(state: &AppState, email: &str, role: Role) -> (String, i32) {
    let user = repo::create_user(&state.pool, email, "pw", role, None).unwrap();
    let basket = repo::find_or_create_basket(&state.pool, user.get_id()).unwrap();
    let token = state.tokens.issue_session(&user).unwrap();
    state.sessions.put(
        token.clone(),
        AuthenticatedUser {
            user,
            bid: basket.get_id(),
            expires_at: chrono::Utc::now() + state.tokens.ttl(),
        },
    );
    (token, basket.get_id())
}

/// Creates a product with the given stock and per-user limit
pub fn create_test_product(state: &AppState, stock: i32, limit_per_user: Option<i32>) -> i32 {
    let (product, _) = repo::create_product(
        &state.pool,
        NewProduct::new("Apple Juice".to_string(), "1000ml".to_string(), 1.99),
        stock,
        limit_per_user,
    ).unwrap();
    product.get_id()
}

/// Sends a request with an optional bearer token and JSON body
///
/// ### Returns
///
/// The status code and the parsed JSON body (`Null` for an empty body)
pub async fn send(
    state: &Arc<AppState>,
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

    let response = create_app(state.clone())
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

/// Generates strings with whitespace, quotes, unicode and control characters
pub fn arb_messy_string() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_./:-]{0,32}",
        "\\PC{0,32}",
        Just(String::new()),
        Just("  padded  ".to_string()),
        Just("quote\"and'apostrophe".to_string()),
        Just("line\nbreak\ttab".to_string()),
    ]
}


use diesel::sql_types::Text;
use diesel::QueryableByName;

#[derive(QueryableByName, Debug)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Tests the setup_test_db function
///
/// This test verifies that:
/// 1. The test database can be created and connected to
/// 2. The database has the expected tables
/// 3. The app answers on the fresh database
#[tokio::test]
async fn test_setup_test_db() {
    let pool = setup_test_db();
    let mut conn = pool.get().unwrap();

    let table_names: Vec<TableName> = diesel::sql_query("SELECT name FROM sqlite_master WHERE type='table'")
        .load(&mut conn)
        .expect("Failed to load table names");

    let expected_tables = vec![
        "users", "products", "quantities", "baskets", "basket_items", "reviews",
        "__diesel_schema_migrations" // Diesel's migration tracking table
    ];

    for table in expected_tables {
        let exists = table_names.iter().any(|t| t.name == table);
        assert!(exists, "Table '{}' not found in database", table);

        let query = format!("SELECT COUNT(*) FROM {}", table);
        let result = diesel::sql_query(&query).execute(&mut conn);
        assert!(result.is_ok(), "Failed to query table '{}': {:?}", table, result.err());
    }
    drop(conn);

    let state = setup_test_state();
    let (status, body) = send(&state, "GET", "/rest/products/1/reviews", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!([]));
}

#[test]
fn test_foreign_keys_are_enforced() {
    let pool = setup_test_db();
    let mut conn = pool.get().unwrap();
    let result = diesel::sql_query("INSERT INTO baskets (user_id, created_at, updated_at) VALUES (999, '2025-01-01 00:00:00', '2025-01-01 00:00:00')")
        .execute(&mut conn);
    assert!(result.is_err());
}
