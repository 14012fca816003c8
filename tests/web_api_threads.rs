//! Web API Forum Tests
//!
//! Integration tests for threads, messages, reactions, search and stats.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{bearer, create_admin, create_test_server, create_thread, post_message, register};

// ============================================================================
// Threads
// ============================================================================

#[tokio::test]
async fn test_create_thread_requires_auth() {
    let (server, _db) = create_test_server().await;

    server
        .post("/api/threads")
        .json(&json!({ "title": "Hello", "description": "World" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_get_thread() {
    let (server, _db) = create_test_server().await;
    let token = register(&server, "alice").await;

    let thread = create_thread(
        &server,
        &token,
        json!({
            "title": "Borrow checker tips",
            "description": "Share what helped you",
            "tags": "Rust, lifetimes, rust"
        }),
    )
    .await;
    assert_eq!(thread["status"], "open");
    assert_eq!(thread["visibility"], "public");
    assert_eq!(thread["author"]["username"], "alice");
    assert_eq!(thread["tags"], json!(["Rust", "lifetimes"]));

    let id = thread["id"].as_i64().unwrap();
    post_message(&server, &token, id, "Clone less, borrow more").await;

    let response = server.get(&format!("/api/threads/{id}")).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["title"], "Borrow checker tips");
    assert_eq!(body["data"]["view_count"], 1);
    assert_eq!(body["data"]["message_count"], 1);
    assert_eq!(body["data"]["messages"][0]["content"], "Clone less, borrow more");
}

#[tokio::test]
async fn test_create_thread_short_title() {
    let (server, _db) = create_test_server().await;
    let token = register(&server, "alice").await;

    let response = server
        .post("/api/threads")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "Hi", "description": "Too short a title" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_missing_thread() {
    let (server, _db) = create_test_server().await;

    let response = server.get("/api/threads/9999").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Thread not found");
}

#[tokio::test]
async fn test_private_thread_hidden_from_others() {
    let (server, _db) = create_test_server().await;
    let owner = register(&server, "alice").await;
    let other = register(&server, "bob").await;

    let thread = create_thread(
        &server,
        &owner,
        json!({
            "title": "Private notes",
            "description": "Only for me",
            "visibility": "private"
        }),
    )
    .await;
    let id = thread["id"].as_i64().unwrap();

    server
        .get(&format!("/api/threads/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get(&format!("/api/threads/{id}"))
        .add_header(AUTHORIZATION, bearer(&other))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .get(&format!("/api/threads/{id}"))
        .add_header(AUTHORIZATION, bearer(&owner))
        .await
        .assert_status_ok();

    let list: Value = server.get("/api/threads").await.json();
    assert_eq!(list["meta"]["total"], 0);
}

#[tokio::test]
async fn test_list_threads_filters_and_pagination() {
    let (server, _db) = create_test_server().await;
    let token = register(&server, "alice").await;

    for i in 0..3 {
        create_thread(
            &server,
            &token,
            json!({ "title": format!("Thread number {i}"), "description": "Body" }),
        )
        .await;
    }
    let closed = create_thread(
        &server,
        &token,
        json!({ "title": "Closed thread", "description": "Body" }),
    )
    .await;
    server
        .put(&format!("/api/threads/{}", closed["id"]))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "status": "closed" }))
        .await
        .assert_status_ok();

    let open: Value = server.get("/api/threads?per_page=2").await.json();
    assert_eq!(open["meta"]["total"], 3);
    assert_eq!(open["meta"]["per_page"], 2);
    assert_eq!(open["data"].as_array().unwrap().len(), 2);
    assert_eq!(open["data"][0]["title"], "Thread number 2");

    let closed_list: Value = server.get("/api/threads?status=closed").await.json();
    assert_eq!(closed_list["meta"]["total"], 1);

    let all: Value = server.get("/api/threads?status=all").await.json();
    assert_eq!(all["meta"]["total"], 4);

    server
        .get("/api/threads?status=deleted")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let far: Value = server
        .get("/api/threads?page=9223372036854775807&per_page=100")
        .await
        .json();
    assert_eq!(far["meta"]["total"], 3);
    assert_eq!(far["data"].as_array().unwrap().len(), 0);

    server
        .get("/?page=9223372036854775807&per_page=1")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_update_thread_permissions() {
    let (server, _db) = create_test_server().await;
    let owner = register(&server, "alice").await;
    let other = register(&server, "bob").await;

    let thread = create_thread(
        &server,
        &owner,
        json!({ "title": "Original title", "description": "Body" }),
    )
    .await;
    let id = thread["id"].as_i64().unwrap();

    server
        .put(&format!("/api/threads/{id}"))
        .add_header(AUTHORIZATION, bearer(&other))
        .json(&json!({ "title": "Hijacked" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    server
        .put(&format!("/api/threads/{id}"))
        .add_header(AUTHORIZATION, bearer(&owner))
        .json(&json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .put(&format!("/api/threads/{id}"))
        .add_header(AUTHORIZATION, bearer(&owner))
        .json(&json!({ "title": "Better title", "tags": ["news"] }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["title"], "Better title");
    assert_eq!(body["data"]["tags"], json!(["news"]));
}

#[tokio::test]
async fn test_delete_thread() {
    let (server, _db) = create_test_server().await;
    let owner = register(&server, "alice").await;

    let thread = create_thread(
        &server,
        &owner,
        json!({ "title": "Short lived", "description": "Body" }),
    )
    .await;
    let id = thread["id"].as_i64().unwrap();
    post_message(&server, &owner, id, "A reply").await;

    server
        .delete(&format!("/api/threads/{id}"))
        .add_header(AUTHORIZATION, bearer(&owner))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/api/threads/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let stats: Value = server.get("/api/stats").await.json();
    assert_eq!(stats["data"]["thread_count"], 0);
    assert_eq!(stats["data"]["message_count"], 0);
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_post_message_in_closed_thread() {
    let (server, _db) = create_test_server().await;
    let owner = register(&server, "alice").await;

    let thread = create_thread(
        &server,
        &owner,
        json!({ "title": "Closing soon", "description": "Body" }),
    )
    .await;
    let id = thread["id"].as_i64().unwrap();
    server
        .put(&format!("/api/threads/{id}"))
        .add_header(AUTHORIZATION, bearer(&owner))
        .json(&json!({ "status": "closed" }))
        .await
        .assert_status_ok();

    let response = server
        .post(&format!("/api/threads/{id}/messages"))
        .add_header(AUTHORIZATION, bearer(&owner))
        .json(&json!({ "content": "Too late" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_message_control_chars_rejected() {
    let (server, _db) = create_test_server().await;
    let owner = register(&server, "alice").await;
    let thread = create_thread(
        &server,
        &owner,
        json!({ "title": "Images", "description": "Body" }),
    )
    .await;

    let response = server
        .post(&format!("/api/threads/{}/messages", thread["id"]))
        .add_header(AUTHORIZATION, bearer(&owner))
        .json(&json!({ "content": "Look", "image_url": "http://x.test/\u{0007}.png" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_list_messages_sorting() {
    let (server, _db) = create_test_server().await;
    let alice = register(&server, "alice").await;
    let bob = register(&server, "bob").await;

    let thread = create_thread(
        &server,
        &alice,
        json!({ "title": "Sorting", "description": "Body" }),
    )
    .await;
    let id = thread["id"].as_i64().unwrap();

    let first = post_message(&server, &alice, id, "first").await;
    post_message(&server, &alice, id, "second").await;

    server
        .post(&format!("/api/messages/{}/like", first["id"]))
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .assert_status_ok();

    let oldest: Value = server
        .get(&format!("/api/threads/{id}/messages?sort_by=oldest"))
        .await
        .json();
    assert_eq!(oldest["data"][0]["content"], "first");
    assert_eq!(oldest["meta"]["total"], 2);

    let newest: Value = server
        .get(&format!("/api/threads/{id}/messages"))
        .await
        .json();
    assert_eq!(newest["data"][0]["content"], "second");

    let likes: Value = server
        .get(&format!("/api/threads/{id}/messages?sort_by=likes"))
        .await
        .json();
    assert_eq!(likes["data"][0]["content"], "first");
    assert_eq!(likes["data"][0]["likes"], 1);
}

#[tokio::test]
async fn test_update_and_delete_message() {
    let (server, _db) = create_test_server().await;
    let alice = register(&server, "alice").await;
    let bob = register(&server, "bob").await;

    let thread = create_thread(
        &server,
        &alice,
        json!({ "title": "Edits", "description": "Body" }),
    )
    .await;
    let message = post_message(&server, &alice, thread["id"].as_i64().unwrap(), "typo").await;
    let id = message["id"].as_i64().unwrap();

    server
        .put(&format!("/api/messages/{id}"))
        .add_header(AUTHORIZATION, bearer(&bob))
        .json(&json!({ "content": "vandalism" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = server
        .put(&format!("/api/messages/{id}"))
        .add_header(AUTHORIZATION, bearer(&alice))
        .json(&json!({ "content": "fixed" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["content"], "fixed");

    server
        .delete(&format!("/api/messages/{id}"))
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .delete(&format!("/api/messages/{id}"))
        .add_header(AUTHORIZATION, bearer(&alice))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Reactions
// ============================================================================

#[tokio::test]
async fn test_reactions() {
    let (server, _db) = create_test_server().await;
    let alice = register(&server, "alice").await;
    let bob = register(&server, "bob").await;

    let thread = create_thread(
        &server,
        &alice,
        json!({ "title": "Reactions", "description": "Body" }),
    )
    .await;
    let message = post_message(&server, &alice, thread["id"].as_i64().unwrap(), "Opinion").await;
    let id = message["id"].as_i64().unwrap();

    let liked: Value = server
        .post(&format!("/api/messages/{id}/like"))
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .json();
    assert_eq!(liked["data"]["likes"], 1);
    assert_eq!(liked["data"]["user_reaction"], "like");

    // Same reaction twice is rejected
    server
        .post(&format!("/api/messages/{id}/like"))
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // The opposite reaction replaces the first
    let disliked: Value = server
        .post(&format!("/api/messages/{id}/dislike"))
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .json();
    assert_eq!(disliked["data"]["likes"], 0);
    assert_eq!(disliked["data"]["dislikes"], 1);

    let removed: Value = server
        .delete(&format!("/api/messages/{id}/reaction"))
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .json();
    assert_eq!(removed["data"]["dislikes"], 0);
    assert!(removed["data"]["user_reaction"].is_null());

    server
        .post("/api/messages/9999/like")
        .add_header(AUTHORIZATION, bearer(&bob))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Search, categories and stats
// ============================================================================

#[tokio::test]
async fn test_search() {
    let (server, _db) = create_test_server().await;
    let token = register(&server, "alice").await;

    create_thread(
        &server,
        &token,
        json!({ "title": "Async runtimes compared", "description": "tokio and friends" }),
    )
    .await;
    create_thread(
        &server,
        &token,
        json!({ "title": "Gardening", "description": "Tomatoes", "tags": ["outdoors"] }),
    )
    .await;
    create_thread(
        &server,
        &token,
        json!({
            "title": "Hidden async musings",
            "description": "Private",
            "visibility": "private"
        }),
    )
    .await;

    let by_title: Value = server.get("/api/search?q=ASYNC").await.json();
    assert_eq!(by_title["meta"]["total"], 1);
    assert_eq!(by_title["data"][0]["title"], "Async runtimes compared");

    let by_tag: Value = server.get("/api/search?q=outdoors").await.json();
    assert_eq!(by_tag["data"][0]["title"], "Gardening");

    let wildcard: Value = server.get("/api/search?q=%25").await.json();
    assert_eq!(wildcard["meta"]["total"], 0);

    server
        .get("/api/search")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_categories() {
    let (server, db) = create_test_server().await;
    let admin = create_admin(&server, &db, "moderator1").await;
    let user = register(&server, "alice").await;

    server
        .post("/api/admin/categories")
        .add_header(AUTHORIZATION, bearer(&user))
        .json(&json!({ "name": "General" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = server
        .post("/api/admin/categories")
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({ "name": "General", "description": "Anything goes" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let category_id = response.json::<Value>()["data"]["id"].as_i64().unwrap();

    create_thread(
        &server,
        &user,
        json!({ "title": "In a category", "description": "Body", "category_id": category_id }),
    )
    .await;

    let category: Value = server
        .get(&format!("/api/categories/{category_id}"))
        .await
        .json();
    assert_eq!(category["data"]["thread_count"], 1);

    let filtered: Value = server
        .get(&format!("/api/threads?category_id={category_id}"))
        .await
        .json();
    assert_eq!(filtered["meta"]["total"], 1);

    let list: Value = server.get("/api/categories").await.json();
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    server
        .put(&format!("/api/admin/categories/{category_id}"))
        .add_header(AUTHORIZATION, bearer(&admin))
        .json(&json!({ "name": "Renamed" }))
        .await
        .assert_status_ok();

    server
        .delete(&format!("/api/admin/categories/{category_id}"))
        .add_header(AUTHORIZATION, bearer(&admin))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/api/categories/{category_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_global_stats() {
    let (server, _db) = create_test_server().await;
    let token = register(&server, "alice").await;
    let thread = create_thread(
        &server,
        &token,
        json!({ "title": "Counting", "description": "Body" }),
    )
    .await;
    post_message(&server, &token, thread["id"].as_i64().unwrap(), "one").await;

    let stats: Value = server.get("/api/stats").await.json();
    assert_eq!(stats["data"]["user_count"], 1);
    assert_eq!(stats["data"]["thread_count"], 1);
    assert_eq!(stats["data"]["message_count"], 1);
    assert_eq!(stats["data"]["recent_threads"][0]["title"], "Counting");
    assert_eq!(stats["data"]["active_users"][0]["username"], "alice");
}
