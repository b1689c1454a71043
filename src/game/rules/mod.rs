//! Game rules for tic-tac-toe.
//!
//! Pure functions for evaluating board state. Rules are separated from board
//! storage so the engine and tests can evaluate positions directly.

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::check_winner;

use super::types::{Board, GameStatus};
use tracing::instrument;

/// Evaluates a board: win first, then draw, otherwise still in progress.
#[instrument]
pub fn evaluate(board: &Board) -> GameStatus {
    if let Some(winner) = check_winner(board) {
        GameStatus::Won(winner)
    } else if is_full(board) {
        GameStatus::Draw
    } else {
        GameStatus::InProgress
    }
}
