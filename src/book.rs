//! Lookup tables that drive the AI: loading, parsing, and shared storage.
//!
//! Each mark has its own table mapping a canonical board key to the move
//! the AI should answer with. The tables are loaded once, wrapped in `Arc`,
//! and never mutated afterwards; the service starts answering requests
//! before the tables arrive and stalls AI turns until they do.

use crate::game::{BoardKey, Mark, Position};
use derive_more::{Display, Error};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, instrument};

// ─────────────────────────────────────────────────────────────
//  Errors
// ─────────────────────────────────────────────────────────────

/// Lookup table error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Book error: {} at {}:{}", message, file, line)]
pub struct BookError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl BookError {
    /// Creates a new book error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<std::io::Error> for BookError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(format!("Io error: {}", err))
    }
}

impl From<serde_json::Error> for BookError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("Json error: {}", err))
    }
}

// ─────────────────────────────────────────────────────────────
//  Tables
// ─────────────────────────────────────────────────────────────

/// Immutable move table for one mark.
///
/// Keys are canonical nine-character board encodings; values are the
/// square to answer with. Tables may be partial: a missing key is a
/// legitimate answer, reported as `None`.
#[derive(Debug, Clone, Default)]
pub struct MoveBook {
    entries: HashMap<BoardKey, Position>,
}

impl MoveBook {
    /// Parses a table from its JSON wire form: an object mapping board
    /// keys to square indices 0-8.
    ///
    /// The whole table is rejected on the first malformed key or
    /// out-of-range index; a half-validated table is worse than none.
    #[instrument(skip(bytes), fields(len = bytes.len()))]
    pub fn parse(bytes: &[u8]) -> Result<Self, BookError> {
        let raw: HashMap<String, u8> = serde_json::from_slice(bytes)?;
        let mut entries = HashMap::with_capacity(raw.len());
        for (key, index) in raw {
            let key: BoardKey = key
                .parse()
                .map_err(|e| BookError::new(format!("Bad board key: {}", e)))?;
            let position = Position::from_index(index as usize).ok_or_else(|| {
                BookError::new(format!("Square index {} out of range for {}", index, key))
            })?;
            entries.insert(key, position);
        }
        debug!(entries = entries.len(), "Parsed move table");
        Ok(Self { entries })
    }

    /// Builds a table from in-memory entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (BoardKey, Position)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Looks up the stored answer for a board, if the table has one.
    pub fn best_move(&self, key: &BoardKey) -> Option<Position> {
        self.entries.get(key).copied()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The pair of move tables, one per mark.
#[derive(Debug, Clone, Default)]
pub struct Playbook {
    x: MoveBook,
    o: MoveBook,
}

impl Playbook {
    /// Creates a playbook from the two tables.
    pub fn new(x: MoveBook, o: MoveBook) -> Self {
        Self { x, o }
    }

    /// Returns the table consulted when the given mark moves.
    pub fn table_for(&self, mark: Mark) -> &MoveBook {
        match mark {
            Mark::X => &self.x,
            Mark::O => &self.o,
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Sources
// ─────────────────────────────────────────────────────────────

/// Where move tables come from.
#[async_trait::async_trait]
pub trait BookSource: Send + Sync {
    /// Fetches the table for one mark.
    async fn fetch(&self, mark: Mark) -> Result<MoveBook, BookError>;
}

/// Loads tables from JSON files on disk.
///
/// Files are named `tictactoe_lookup_X.json` and `tictactoe_lookup_O.json`
/// inside the configured directory.
#[derive(Debug, Clone)]
pub struct FileBookSource {
    dir: PathBuf,
}

impl FileBookSource {
    /// Creates a source rooted at the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, mark: Mark) -> PathBuf {
        self.dir
            .join(format!("tictactoe_lookup_{}.json", mark.symbol()))
    }
}

#[async_trait::async_trait]
impl BookSource for FileBookSource {
    #[instrument(skip(self), fields(path = %self.path_for(mark).display()))]
    async fn fetch(&self, mark: Mark) -> Result<MoveBook, BookError> {
        let bytes = tokio::fs::read(self.path_for(mark)).await?;
        MoveBook::parse(&bytes)
    }
}

// ─────────────────────────────────────────────────────────────
//  Store
// ─────────────────────────────────────────────────────────────

/// Shared slot holding the playbook once loading finishes.
///
/// Starts empty. Readers take an `Arc` snapshot and never block a load
/// in progress; a snapshot of `None` means AI turns stall for now.
#[derive(Debug, Clone, Default)]
pub struct BookStore {
    inner: Arc<RwLock<Option<Arc<Playbook>>>>,
}

impl BookStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current playbook, if loaded.
    pub fn snapshot(&self) -> Option<Arc<Playbook>> {
        self.inner.read().unwrap().clone()
    }

    /// True once a playbook has been installed.
    pub fn is_loaded(&self) -> bool {
        self.inner.read().unwrap().is_some()
    }

    /// Installs a playbook, replacing any previous one.
    #[instrument(skip(self, playbook))]
    pub fn install(&self, playbook: Playbook) {
        info!(
            x_entries = playbook.table_for(Mark::X).len(),
            o_entries = playbook.table_for(Mark::O).len(),
            "Installing move tables"
        );
        *self.inner.write().unwrap() = Some(Arc::new(playbook));
    }

    /// Fetches both tables from a source and installs them together.
    ///
    /// Nothing is installed unless both fetches succeed; the store keeps
    /// whatever it held before.
    #[instrument(skip(self, source))]
    pub async fn load_from(&self, source: &dyn BookSource) -> Result<(), BookError> {
        let x = source.fetch(Mark::X).await?;
        let o = source.fetch(Mark::O).await?;
        self.install(Playbook::new(x, o));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table() {
        let book = MoveBook::parse(br#"{"---------": 4, "----X----": 0}"#).unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(
            book.best_move(&"---------".parse().unwrap()),
            Some(Position::Center)
        );
        assert_eq!(
            book.best_move(&"----X----".parse().unwrap()),
            Some(Position::TopLeft)
        );
    }

    #[test]
    fn test_missing_key_is_none() {
        let book = MoveBook::parse(br#"{"---------": 4}"#).unwrap();
        assert_eq!(book.best_move(&"X--------".parse().unwrap()), None);
    }

    #[test]
    fn test_parse_rejects_bad_key() {
        assert!(MoveBook::parse(br#"{"--------": 4}"#).is_err());
        assert!(MoveBook::parse(br#"{"--------Z": 4}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_index() {
        assert!(MoveBook::parse(br#"{"---------": 9}"#).is_err());
    }

    #[test]
    fn test_store_starts_empty() {
        let store = BookStore::new();
        assert!(!store.is_loaded());
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_install_makes_snapshot_available() {
        let store = BookStore::new();
        store.install(Playbook::new(
            MoveBook::from_entries([("---------".parse().unwrap(), Position::Center)]),
            MoveBook::default(),
        ));
        assert!(store.is_loaded());
        let book = store.snapshot().unwrap();
        assert_eq!(
            book.table_for(Mark::X)
                .best_move(&"---------".parse().unwrap()),
            Some(Position::Center)
        );
    }
}
