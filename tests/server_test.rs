//! Tests for the HTTP service surface.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tictactoe_oracle::{
    AppState, BookStore, MoveBook, Playbook, Position, SessionManager, TurnScheduler,
};
use tower::ServiceExt;

const AI_DELAY: Duration = Duration::from_millis(10);
const PATIENCE: Duration = Duration::from_secs(2);

fn demo_playbook() -> Playbook {
    Playbook::new(
        MoveBook::from_entries([("---------".parse().expect("Bad key"), Position::Center)]),
        MoveBook::from_entries([("----X----".parse().expect("Bad key"), Position::TopLeft)]),
    )
}

/// Builds the app, optionally with tables already installed.
fn test_app(loaded: bool) -> Router {
    let sessions = SessionManager::new();
    let books = BookStore::new();
    if loaded {
        books.install(demo_playbook());
    }
    let scheduler = TurnScheduler::new(sessions.clone(), books.clone(), AI_DELAY);
    tictactoe_oracle::router(Arc::new(AppState {
        sessions,
        books,
        scheduler,
    }))
}

/// Sends one request and returns the status plus the parsed body.
///
/// Error responses carry plain text; those come back as a JSON string.
async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    let value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

/// Polls the session snapshot until its board matches or patience runs out.
async fn wait_for_board(app: &Router, id: &str, board: &str) -> Value {
    let deadline = tokio::time::Instant::now() + PATIENCE;
    loop {
        let (status, view) = send(app, "GET", &format!("/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        if view["board"] == board {
            return view;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "Board never reached {board}, last seen {}",
            view["board"]
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_health() {
    let app = test_app(true);
    let (status, body) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_and_fetch_session() {
    let app = test_app(true);

    let (status, view) = send(&app, "POST", "/sessions", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["session_id"], "session-1");
    assert_eq!(view["board"], "---------");
    assert_eq!(view["status"], "InProgress");
    assert_eq!(view["ai_mark"], Value::Null);
    assert_eq!(view["to_move"], "X");
    assert_eq!(view["book_loaded"], true);

    let (status, fetched) = send(&app, "GET", "/sessions/session-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, view);
}

#[tokio::test]
async fn test_create_with_client_id_and_conflict() {
    let app = test_app(true);

    let body = json!({ "session_id": "lobby" });
    let (status, view) = send(&app, "POST", "/sessions", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["session_id"], "lobby");

    let (status, _) = send(&app, "POST", "/sessions", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_session_not_found() {
    let app = test_app(true);
    let (status, _) = send(&app, "GET", "/sessions/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/sessions/ghost/moves",
        Some(json!({ "position": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_human_opens_and_ai_answers() {
    let app = test_app(true);
    send(&app, "POST", "/sessions", Some(json!({ "session_id": "g" }))).await;

    let (status, view) = send(
        &app,
        "POST",
        "/sessions/g/start",
        Some(json!({ "first": "human" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["ai_mark"], "O");
    assert_eq!(view["to_move"], "X");

    let (status, view) = send(
        &app,
        "POST",
        "/sessions/g/moves",
        Some(json!({ "position": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["board"], "----X----");
    assert_eq!(view["to_move"], "O");

    // The AI answers asynchronously after its delay.
    let view = wait_for_board(&app, "g", "O---X----").await;
    assert_eq!(view["to_move"], "X");
    assert_eq!(view["status"], "InProgress");
}

#[tokio::test]
async fn test_ai_opens_when_asked() {
    let app = test_app(true);
    send(&app, "POST", "/sessions", Some(json!({ "session_id": "g" }))).await;

    let (status, view) = send(
        &app,
        "POST",
        "/sessions/g/start",
        Some(json!({ "first": "ai" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["ai_mark"], "X");

    let view = wait_for_board(&app, "g", "----X----").await;
    assert_eq!(view["to_move"], "O");
}

#[tokio::test]
async fn test_move_rejections() {
    let app = test_app(true);
    send(&app, "POST", "/sessions", Some(json!({ "session_id": "g" }))).await;

    // Before start: conflict.
    let (status, _) = send(
        &app,
        "POST",
        "/sessions/g/moves",
        Some(json!({ "position": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(
        &app,
        "POST",
        "/sessions/g/start",
        Some(json!({ "first": "human" })),
    )
    .await;

    // Out of range: bad request.
    let (status, _) = send(
        &app,
        "POST",
        "/sessions/g/moves",
        Some(json!({ "position": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(
        &app,
        "POST",
        "/sessions/g/moves",
        Some(json!({ "position": 4 })),
    )
    .await;

    // Right after moving it is the AI's turn.
    let (status, _) = send(
        &app,
        "POST",
        "/sessions/g/moves",
        Some(json!({ "position": 8 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Once the AI answered, its square is taken.
    wait_for_board(&app, "g", "O---X----").await;
    let (status, body) = send(
        &app,
        "POST",
        "/sessions/g/moves",
        Some(json!({ "position": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body.as_str().unwrap_or_default().contains("occupied"),
        "Unexpected body: {body}"
    );
}

#[tokio::test]
async fn test_reset_returns_to_selection() {
    let app = test_app(true);
    send(&app, "POST", "/sessions", Some(json!({ "session_id": "g" }))).await;
    send(
        &app,
        "POST",
        "/sessions/g/start",
        Some(json!({ "first": "human" })),
    )
    .await;
    send(
        &app,
        "POST",
        "/sessions/g/moves",
        Some(json!({ "position": 4 })),
    )
    .await;

    let (status, view) = send(&app, "POST", "/sessions/g/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["board"], "---------");
    assert_eq!(view["ai_mark"], Value::Null);
    assert_eq!(view["status"], "InProgress");
}

#[tokio::test]
async fn test_books_status() {
    let app = test_app(true);
    let (status, body) = send(&app, "GET", "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], true);
    assert_eq!(body["x_entries"], 1);
    assert_eq!(body["o_entries"], 1);
}

#[tokio::test]
async fn test_service_runs_before_tables_load() {
    let app = test_app(false);

    let (status, body) = send(&app, "GET", "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], false);
    assert_eq!(body["x_entries"], 0);

    // Play proceeds; the AI simply has not answered yet.
    send(&app, "POST", "/sessions", Some(json!({ "session_id": "g" }))).await;
    send(
        &app,
        "POST",
        "/sessions/g/start",
        Some(json!({ "first": "human" })),
    )
    .await;
    let (status, view) = send(
        &app,
        "POST",
        "/sessions/g/moves",
        Some(json!({ "position": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["book_loaded"], false);

    tokio::time::sleep(AI_DELAY * 5).await;
    let (_, view) = send(&app, "GET", "/sessions/g", None).await;
    assert_eq!(view["board"], "----X----", "AI must stall without tables");
    assert_eq!(view["to_move"], "O");
}
