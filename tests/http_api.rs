//! Exercises the HTTP surface through the router, without binding a socket.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use bookswap::api::{AppState, router};
use bookswap::gateway::JwtGateway;
use bookswap::types::UserId;
use chrono::TimeDelta;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &[u8] = b"http-test-secret";

fn app() -> Router {
    let db = sled::Config::new().temporary(true).open().unwrap();
    let state = AppState::open(Arc::new(db), Arc::new(JwtGateway::new(SECRET))).unwrap();
    router(state)
}

fn bearer(user: &str) -> String {
    let token = JwtGateway::new(SECRET)
        .issue_token(&UserId::from(user), TimeDelta::hours(1))
        .unwrap();
    format!("Bearer {token}")
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, bearer(user));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn list_book(app: &Router, owner: &str) -> String {
    let (status, book) = call(
        app,
        Method::POST,
        "/api/books",
        Some(owner),
        Some(json!({
            "title": "Piranesi",
            "author": "Susanna Clarke",
            "condition": "Like New",
            "price": 1100
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    book["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn unauthenticated_calls_are_refused_first() {
    let app = app();

    // an invalid body must not change the answer
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/requests",
        None,
        Some(json!({ "bookId": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");
    assert_eq!(body["message"], "no token, authorization denied");

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/requests/request_missing")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/requests/incoming", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn negotiation_over_http() {
    let app = app();
    let book_id = list_book(&app, "alice").await;

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/requests",
        Some("carol"),
        Some(json!({ "bookId": book_id, "message": "interested" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["book"]["title"], "Piranesi");
    // no profile was saved for the seller, so only the id is shown
    assert_eq!(created["seller"], "alice");
    let request_id = created["id"].as_str().unwrap().to_string();

    let (status, incoming) =
        call(&app, Method::GET, "/api/requests/incoming", Some("alice"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(incoming.as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/requests/{request_id}"),
        Some("carol"),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, accepted) = call(
        &app,
        Method::PUT,
        &format!("/api/requests/{request_id}"),
        Some("alice"),
        Some(json!({ "status": "accepted" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "accepted");
    assert_eq!(accepted["version"], 2);

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/requests/{request_id}"),
        Some("carol"),
        Some(json!({ "status": "cancelled" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_operation");
}

#[tokio::test]
async fn request_refusals_map_to_status_codes() {
    let app = app();
    let book_id = list_book(&app, "alice").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/requests",
        Some("carol"),
        Some(json!({ "bookId": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/requests",
        Some("carol"),
        Some(json!({ "bookId": "book_nope", "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/requests",
        Some("alice"),
        Some(json!({ "bookId": book_id, "message": "mine" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_operation");

    let payload = json!({ "bookId": book_id, "message": "hi" });
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/requests",
        Some("carol"),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/requests",
        Some("carol"),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/requests/request_missing",
        Some("alice"),
        Some(json!({ "status": "pending" })),
    )
    .await;
    // status value is checked before the request is looked up
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/requests/request_missing",
        Some("alice"),
        Some(json!({ "status": "declined" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_and_wishlist_routes() {
    let app = app();
    let book_id = list_book(&app, "alice").await;

    let (status, books) = call(&app, Method::GET, "/api/books?search=piran", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books.as_array().unwrap().len(), 1);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/users/me/wishlist/{book_id}"),
        Some("carol"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, wishlist) =
        call(&app, Method::GET, "/api/users/me/wishlist", Some("carol"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wishlist[0]["id"], book_id.as_str());

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/books/{book_id}"),
        Some("carol"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/books/{book_id}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::GET, &format!("/api/books/{book_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_routes() {
    let app = app();

    let (status, _) = call(&app, Method::GET, "/api/users/me", Some("alice"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, profile) = call(
        &app,
        Method::PUT,
        "/api/users/me",
        Some("alice"),
        Some(json!({ "name": "Alice", "email": "alice@example.com", "profilePic": "a.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["profilePic"], "a.png");

    let (status, public) = call(&app, Method::GET, "/api/users/alice", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["name"], "Alice");
}
