//! HTTP service surface.
//!
//! Endpoints:
//! - POST /sessions              - Create a game session
//! - GET  /sessions/{id}         - Get a session snapshot
//! - POST /sessions/{id}/start   - Start a game (choose who opens)
//! - POST /sessions/{id}/moves   - Make a human move
//! - POST /sessions/{id}/reset   - Back to the selection prompt
//! - GET  /books                 - Lookup table load state
//! - GET  /healthz               - Health check
//!
//! The AI answers asynchronously: a successful move or start schedules the
//! AI turn and returns immediately; clients poll the session snapshot.

use crate::book::BookStore;
use crate::engine::MoveError;
use crate::game::{GameStatus, Mark, Position};
use crate::scheduler::TurnScheduler;
use crate::session::{GameSession, SessionManager};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// All live game sessions.
    pub sessions: SessionManager,
    /// Lookup tables, present once loading finishes.
    pub books: BookStore,
    /// Deferred AI turns.
    pub scheduler: TurnScheduler,
}

// ─────────────────────────────────────────────────────────────
//  Wire types
// ─────────────────────────────────────────────────────────────

/// Request for creating a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Client-chosen session ID; one is generated when omitted.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Who takes the opening move. X always opens, so this decides which
/// mark the AI plays: a human opening makes the AI `O`, an AI opening
/// makes the AI `X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstMove {
    /// The human opens as X.
    Human,
    /// The AI opens as X.
    Ai,
}

/// Request for starting a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartGameRequest {
    /// Who moves first.
    pub first: FirstMove,
}

/// Request for making a move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Square index 0-8, row-major from the top-left.
    pub position: usize,
}

/// Snapshot of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    /// Session ID.
    pub session_id: String,
    /// Canonical nine-character board encoding.
    pub board: String,
    /// Mark whose turn it is.
    pub to_move: Mark,
    /// Game status.
    pub status: GameStatus,
    /// The AI's mark, absent while selecting.
    pub ai_mark: Option<Mark>,
    /// Whether the lookup tables have loaded.
    pub book_loaded: bool,
}

impl SessionView {
    fn of(session: &GameSession, book_loaded: bool) -> Self {
        Self {
            session_id: session.id.clone(),
            board: session.engine.board().to_string(),
            to_move: session.engine.to_move(),
            status: session.engine.status().clone(),
            ai_mark: session.engine.ai_mark(),
            book_loaded,
        }
    }
}

/// Lookup table load state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookStatusView {
    /// Whether both tables are installed.
    pub loaded: bool,
    /// Entry count in the X table.
    pub x_entries: usize,
    /// Entry count in the O table.
    pub o_entries: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when the service answers.
    pub status: String,
    /// Crate version.
    pub version: String,
}

// ─────────────────────────────────────────────────────────────
//  Handlers
// ─────────────────────────────────────────────────────────────

fn session_not_found(id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Session not found: {}", id))
}

fn move_rejection(error: MoveError) -> (StatusCode, String) {
    let status = match error {
        MoveError::SquareOccupied(_) => StatusCode::BAD_REQUEST,
        MoveError::NotStarted | MoveError::GameOver | MoveError::NotYourTurn(_) => {
            StatusCode::CONFLICT
        }
    };
    (status, format!("Invalid move: {}", error))
}

/// Create a new session.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let id = state
        .sessions
        .create_session(req.session_id)
        .map_err(|e| (StatusCode::CONFLICT, e))?;

    let session = state.sessions.get_session(&id).ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session vanished after creation".to_string(),
        )
    })?;

    Ok(Json(SessionView::of(&session, state.books.is_loaded())))
}

/// Get a session snapshot.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let session = state
        .sessions
        .get_session(&id)
        .ok_or_else(|| session_not_found(&id))?;

    Ok(Json(SessionView::of(&session, state.books.is_loaded())))
}

/// Start a game, wiping any previous one in the session.
pub async fn start_game(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<StartGameRequest>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let ai_mark = match req.first {
        FirstMove::Human => Mark::O,
        FirstMove::Ai => Mark::X,
    };

    let session = state
        .sessions
        .with_session(&id, |session| {
            session.engine.start(ai_mark, Mark::X);
            session.clone()
        })
        .ok_or_else(|| session_not_found(&id))?;

    state.scheduler.poke(&id);

    Ok(Json(SessionView::of(&session, state.books.is_loaded())))
}

/// Make a human move.
pub async fn make_move(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let position = Position::from_index(req.position).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("Position out of bounds (must be 0-8): {}", req.position),
        )
    })?;

    let (outcome, session) = state
        .sessions
        .with_session(&id, |session| {
            let outcome = session.engine.human_move(position);
            (outcome, session.clone())
        })
        .ok_or_else(|| session_not_found(&id))?;

    outcome.map_err(move_rejection)?;
    state.scheduler.poke(&id);

    Ok(Json(SessionView::of(&session, state.books.is_loaded())))
}

/// Reset a session back to the selection prompt.
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, (StatusCode, String)> {
    let session = state
        .sessions
        .with_session(&id, |session| {
            session.engine.reset();
            session.clone()
        })
        .ok_or_else(|| session_not_found(&id))?;

    Ok(Json(SessionView::of(&session, state.books.is_loaded())))
}

/// Report lookup table load state.
pub async fn book_status(State(state): State<Arc<AppState>>) -> Json<BookStatusView> {
    let snapshot = state.books.snapshot();
    Json(BookStatusView {
        loaded: snapshot.is_some(),
        x_entries: snapshot.as_ref().map_or(0, |b| b.table_for(Mark::X).len()),
        o_entries: snapshot.as_ref().map_or(0, |b| b.table_for(Mark::O).len()),
    })
}

/// Health check handler.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ─────────────────────────────────────────────────────────────
//  Router
// ─────────────────────────────────────────────────────────────

/// Builds the application router with request logging.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/start", post(start_game))
        .route("/sessions/{id}/moves", post(make_move))
        .route("/sessions/{id}/reset", post(reset_session))
        .route("/books", get(book_status))
        .route("/healthz", get(health))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(
                method = %req.method(),
                uri = %req.uri(),
                "Incoming HTTP request"
            );
            req
        }))
        .with_state(state)
}
