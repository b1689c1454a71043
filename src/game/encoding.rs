//! Canonical board encoding used as the lookup table key.
//!
//! A board is encoded as the 9 cell symbols concatenated in position order
//! (left-to-right, top-to-bottom) over the alphabet `X`, `O`, `-`. The empty
//! board is `---------`; a lone X in the center is `----X----`.

use super::position::Position;
use super::types::{Board, Cell};
use strum::IntoEnumIterator;

/// A validated canonical board encoding.
///
/// Always exactly 9 characters of `X`, `O`, or `-`. Lookup tables are keyed
/// by this type, so a malformed key can never enter a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardKey(String);

impl BoardKey {
    /// Returns the encoding as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for BoardKey {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.chars().count() != 9 {
            return Err(EncodingError::InvalidLength(s.chars().count()));
        }
        if let Some(bad) = s.chars().find(|&ch| Cell::from_symbol(ch).is_none()) {
            return Err(EncodingError::InvalidSymbol(bad));
        }
        Ok(BoardKey(s.to_string()))
    }
}

impl std::fmt::Display for BoardKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error parsing a canonical board encoding.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum EncodingError {
    /// The encoding must be exactly 9 characters.
    #[display("Encoding must be 9 characters, got {_0}")]
    InvalidLength(usize),

    /// The encoding may only contain `X`, `O`, and `-`.
    #[display("Invalid symbol {_0:?} in encoding")]
    InvalidSymbol(char),
}

impl std::error::Error for EncodingError {}

impl Board {
    /// Returns the canonical encoding of this board.
    pub fn key(&self) -> BoardKey {
        let mut encoded = String::with_capacity(9);
        for pos in Position::iter() {
            encoded.push(self.get(pos).symbol());
        }
        BoardKey(encoded)
    }

    /// Reconstructs a board from its canonical encoding.
    pub fn from_key(key: &BoardKey) -> Self {
        let mut board = Board::new();
        for (pos, symbol) in Position::iter().zip(key.as_str().chars()) {
            if let Some(cell) = Cell::from_symbol(symbol) {
                board.set(pos, cell);
            }
        }
        board
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for pos in Position::iter() {
            write!(f, "{}", self.get(pos).symbol())?;
        }
        Ok(())
    }
}
