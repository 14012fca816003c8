//! Test helpers for Web API tests.
//!
//! Provides an in-memory test server and helpers to register users,
//! sign in and create forum content.

#![allow(dead_code)]

use axum::http::header::AUTHORIZATION;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use agora::config::{ForumConfig, WebConfig};
use agora::web::handlers::AppState;
use agora::web::middleware::JwtState;
use agora::web::router::create_router;
use agora::{hash_password, Database, NewUser, Role, UserRepository};

/// A password that satisfies the strength rules.
pub const PASSWORD: &str = "Str0ng-Passw0rd!";

/// Create a test configuration with relaxed rate limits.
pub fn create_test_config() -> WebConfig {
    WebConfig {
        cors_origins: vec![],
        jwt_secret: "test-secret-key-for-testing-only".to_string(),
        jwt_expiry_secs: 900,
        serve_static: false,
        static_path: "static".to_string(),
        login_rate_limit: 1000,
        api_rate_limit: 10000,
        trust_proxy_headers: false,
    }
}

/// Create a test server with an in-memory database.
pub async fn create_test_server() -> (TestServer, Database) {
    create_test_server_with(create_test_config()).await
}

/// Create a test server with a custom web configuration.
pub async fn create_test_server_with(config: WebConfig) -> (TestServer, Database) {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");

    let forum = ForumConfig {
        name: "Test Forum".to_string(),
        description: "Forum used by integration tests".to_string(),
    };
    let app_state = Arc::new(
        AppState::new(db.clone(), &config.jwt_secret, config.jwt_expiry_secs)
            .expect("Failed to create app state")
            .with_forum(forum),
    );
    let jwt_state = Arc::new(JwtState::new(&config.jwt_secret));

    let router = create_router(app_state, jwt_state, &config);
    let server = TestServer::new(router).expect("Failed to create test server");

    (server, db)
}

/// `Authorization` header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Register a user through the API and return the token.
pub async fn register(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": PASSWORD
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Sign in and return the full response body.
pub async fn login(server: &TestServer, login: &str, password: &str) -> Value {
    server
        .post("/api/auth/login")
        .json(&json!({ "login": login, "password": password }))
        .await
        .json::<Value>()
}

/// Create an admin account directly in the database and return its token.
pub async fn create_admin(server: &TestServer, db: &Database, username: &str) -> String {
    let hash = hash_password(PASSWORD).unwrap();
    UserRepository::new(db.pool())
        .create(
            &NewUser::new(username, format!("{username}@example.com"), hash)
                .with_role(Role::Admin),
        )
        .await
        .unwrap();

    let body = login(server, username, PASSWORD).await;
    body["data"]["token"].as_str().unwrap().to_string()
}

/// Create a thread and return its JSON.
pub async fn create_thread(server: &TestServer, token: &str, body: Value) -> Value {
    let response = server
        .post("/api/threads")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&body)
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}

/// Post a message and return its JSON.
pub async fn post_message(server: &TestServer, token: &str, thread_id: i64, content: &str) -> Value {
    let response = server
        .post(&format!("/api/threads/{thread_id}/messages"))
        .add_header(AUTHORIZATION, bearer(token))
        .json(&json!({ "content": content }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"].clone()
}
