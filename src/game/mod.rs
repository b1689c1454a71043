//! Core tic-tac-toe domain: board state, canonical encoding, and rules.

mod encoding;
mod position;
pub mod rules;
mod types;

pub use encoding::{BoardKey, EncodingError};
pub use position::Position;
pub use types::{Board, Cell, GameStatus, Mark};
