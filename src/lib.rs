//! Tic-tac-toe oracle library - lookup-driven game service
//!
//! A small game service whose AI never searches: every answer comes from
//! precomputed lookup tables keyed by a canonical board encoding.
//!
//! # Architecture
//!
//! - **Game**: board, marks, canonical encoding, and win/draw rules
//! - **Engine**: per-game state machine with generation-counted phases
//! - **Book**: async-loaded immutable move tables, one per mark
//! - **Scheduler**: delayed AI turns with staleness re-validation
//! - **Server**: axum JSON API over named game sessions
//!
//! # Example
//!
//! ```
//! use tictactoe_oracle::{Engine, Mark, Position};
//!
//! # fn main() -> Result<(), tictactoe_oracle::MoveError> {
//! let mut engine = Engine::new();
//!
//! // Human opens as X against an AI playing O.
//! engine.start(Mark::O, Mark::X);
//! engine.human_move(Position::Center)?;
//! assert_eq!(engine.board().to_string(), "----X----");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod book;
mod config;
mod engine;
mod game;
mod scheduler;
mod server;
mod session;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServiceConfig};

// Crate-level exports - Lookup tables
pub use book::{BookError, BookSource, BookStore, FileBookSource, MoveBook, Playbook};

// Crate-level exports - Engine
pub use engine::{AiReply, Engine, MoveError, StallReason};

// Crate-level exports - Scheduling
pub use scheduler::TurnScheduler;

// Crate-level exports - Session management
pub use session::{GameSession, SessionId, SessionManager};

// Crate-level exports - HTTP service
pub use server::{
    router, AppState, BookStatusView, CreateSessionRequest, FirstMove, HealthResponse,
    MoveRequest, SessionView, StartGameRequest,
};

// Crate-level exports - Game types
pub use game::rules::evaluate;
pub use game::{Board, BoardKey, Cell, EncodingError, GameStatus, Mark, Position};
